use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Quiz, QuizResult, QuizStatus},
};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, quiz_id: &str) -> AppResult<Option<Quiz>>;
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    /// Returns false when no quiz matched.
    async fn mark_ready(&self, quiz_id: &str) -> AppResult<bool>;
    /// Returns false when no quiz matched.
    async fn delete(&self, quiz_id: &str) -> AppResult<bool>;
    /// Ready quizzes belonging to `project_id`, in no particular order.
    async fn list_ready_by_project(&self, project_id: &str) -> AppResult<Vec<Quiz>>;
    /// Pending quizzes generated at or before `cutoff`.
    async fn find_pending_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quiz>>;
    /// Atomically appends to `results`. Returns false when no quiz matched.
    async fn push_result(&self, quiz_id: &str, result: &QuizResult) -> AppResult<bool>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("quizzes");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "quizId": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("quiz_id_unique".to_string())
                    .build(),
            )
            .build();

        let project_index = IndexModel::builder()
            .keys(doc! { "projectId": 1 })
            .options(IndexOptions::builder().name("project_id".to_string()).build())
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(IndexOptions::builder().name("status".to_string()).build())
            .build();

        self.collection
            .create_indexes([id_index, project_index, status_index])
            .await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn find_by_id(&self, quiz_id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "quizId": quiz_id }).await?;
        Ok(quiz)
    }

    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn mark_ready(&self, quiz_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "quizId": quiz_id },
                doc! { "$set": { "status": QuizStatus::Ready.as_str() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, quiz_id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "quizId": quiz_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_ready_by_project(&self, project_id: &str) -> AppResult<Vec<Quiz>> {
        // Records written before the status field existed count as ready.
        let filter = doc! {
            "projectId": project_id,
            "status": { "$ne": QuizStatus::Pending.as_str() },
        };
        let cursor = self.collection.find(filter).await?;
        let quizzes: Vec<Quiz> = cursor.try_collect().await?;
        Ok(quizzes)
    }

    async fn find_pending_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quiz>> {
        let cursor = self
            .collection
            .find(doc! { "status": QuizStatus::Pending.as_str() })
            .await?;
        let pending: Vec<Quiz> = cursor.try_collect().await?;
        Ok(pending
            .into_iter()
            .filter(|quiz| quiz.generated_at <= cutoff)
            .collect())
    }

    async fn push_result(&self, quiz_id: &str, result: &QuizResult) -> AppResult<bool> {
        let update = self
            .collection
            .update_one(
                doc! { "quizId": quiz_id },
                doc! { "$push": { "results": to_bson(result)? } },
            )
            .await?;
        Ok(update.matched_count > 0)
    }
}
