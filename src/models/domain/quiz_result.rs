use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed attempt at a quiz. Write-once; appended to `Quiz::results`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub user_id: String,
    /// Percentage of correct answers, 0 to 100.
    pub score: u8,
    pub answers: Vec<AnswerRecord>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_index: u32,
    pub selected_answer: u8,
    pub is_correct: bool,
}

impl QuizResult {
    pub fn new(user_id: &str, answers: Vec<AnswerRecord>) -> Self {
        let score = score_percent(&answers);
        Self {
            user_id: user_id.to_string(),
            score,
            answers,
            completed_at: Utc::now(),
        }
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

fn score_percent(answers: &[AnswerRecord]) -> u8 {
    if answers.is_empty() {
        return 0;
    }
    let correct = answers.iter().filter(|a| a.is_correct).count() as f64;
    ((correct * 100.0) / answers.len() as f64).round() as u8
}
