use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{QuizConfig, QuizQuestion, QuizResult};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub quiz_id: String,
    pub project_id: String,
    pub config: QuizConfig,
    pub questions: Vec<QuizQuestion>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub results: Vec<QuizResult>,
    #[graphql(skip)]
    #[serde(default = "QuizStatus::ready")]
    pub status: QuizStatus,
}

/// Persistence phase. A quiz is written `Pending`, linked into its project,
/// then flipped to `Ready`. Only `Ready` quizzes are visible to callers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum QuizStatus {
    Pending,
    Ready,
}

impl QuizStatus {
    fn ready() -> Self {
        QuizStatus::Ready
    }

    /// Stored representation, for query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Pending => "Pending",
            QuizStatus::Ready => "Ready",
        }
    }
}

impl Quiz {
    pub fn new_pending(project_id: &str, config: QuizConfig, questions: Vec<QuizQuestion>) -> Self {
        Quiz {
            quiz_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            config,
            questions,
            generated_at: Utc::now(),
            results: Vec::new(),
            status: QuizStatus::Pending,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == QuizStatus::Ready
    }
}
