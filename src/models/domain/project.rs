use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's project: display metadata, the uploaded knowledge document and
/// the quizzes generated from it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "knowledgeURL", default)]
    #[graphql(name = "knowledgeURL")]
    pub knowledge_url: Option<String>,
    /// Append-only, insertion ordered.
    #[serde(default)]
    pub quiz_ids: Vec<String>,
    /// True iff `quiz_ids` is non-empty.
    #[serde(default)]
    pub quiz_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(user_id: &str, name: &str, description: &str) -> Self {
        let now = Utc::now();
        Project {
            project_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            knowledge_url: None,
            quiz_ids: Vec::new(),
            quiz_generated: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// The knowledge URL, treating an empty string the same as absence.
    pub fn source_url(&self) -> Option<&str> {
        self.knowledge_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Appends `quiz_id` unless already linked. Mirrors the store's
    /// `$addToSet` so a retried link never duplicates an entry.
    pub fn link_quiz(&mut self, quiz_id: &str) -> bool {
        if self.quiz_ids.iter().any(|id| id == quiz_id) {
            return false;
        }
        self.quiz_ids.push(quiz_id.to_string());
        self.quiz_generated = true;
        self.updated_at = Utc::now();
        true
    }
}
