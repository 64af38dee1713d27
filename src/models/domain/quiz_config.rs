use std::fmt;

use async_graphql::{Enum, InputObject, SimpleObject};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Generation settings submitted by the caller, embedded verbatim in the
/// resulting quiz.
#[derive(
    Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, SimpleObject, InputObject,
)]
#[serde(rename_all = "camelCase")]
#[graphql(input_name = "QuizConfigInput")]
pub struct QuizConfig {
    pub difficulty: Difficulty,

    #[validate(range(
        min = 5,
        max = 50,
        message = "numberOfQuestions must be between 5 and 50"
    ))]
    pub number_of_questions: u32,
}

impl QuizConfig {
    pub fn new(difficulty: Difficulty, number_of_questions: u32) -> Self {
        Self {
            difficulty,
            number_of_questions,
        }
    }

    pub fn question_count(&self) -> usize {
        self.number_of_questions as usize
    }
}
