use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question_text: String,
    /// Always exactly [`OPTIONS_PER_QUESTION`] entries.
    pub options: Vec<String>,
    pub correct_answer_index: u8,
    pub explanation: Explanation,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Explanation {
    pub reason: String,
    /// Passages of the source document backing the answer. May be empty but
    /// is always present.
    pub references: Vec<String>,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected_answer: u8) -> bool {
        self.correct_answer_index == selected_answer
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options
            .get(self.correct_answer_index as usize)
            .map(String::as_str)
    }
}
