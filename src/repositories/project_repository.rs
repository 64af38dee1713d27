use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Project};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, project_id: &str) -> AppResult<Option<Project>>;
    async fn create(&self, project: Project) -> AppResult<Project>;
    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Project>>;
    /// Returns false when no project matched.
    async fn set_knowledge_url(&self, project_id: &str, url: &str) -> AppResult<bool>;
    /// Atomically adds `quiz_id` to `quizIds` (no-op if already present) and
    /// sets `quizGenerated`. Returns false when no project matched.
    async fn link_quiz(&self, project_id: &str, quiz_id: &str) -> AppResult<bool>;
}

pub struct MongoProjectRepository {
    collection: Collection<Project>,
}

impl MongoProjectRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("projects");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for projects collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "projectId": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("project_id_unique".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "userId": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();

        self.collection.create_indexes([id_index, user_index]).await?;

        log::info!("Successfully created indexes for projects collection");
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MongoProjectRepository {
    async fn find_by_id(&self, project_id: &str) -> AppResult<Option<Project>> {
        let project = self
            .collection
            .find_one(doc! { "projectId": project_id })
            .await?;
        Ok(project)
    }

    async fn create(&self, project: Project) -> AppResult<Project> {
        self.collection.insert_one(&project).await?;
        Ok(project)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Project>> {
        let cursor = self.collection.find(doc! { "userId": user_id }).await?;
        let mut projects: Vec<Project> = cursor.try_collect().await?;
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn set_knowledge_url(&self, project_id: &str, url: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "projectId": project_id },
                doc! { "$set": { "knowledgeURL": url, "updatedAt": to_bson(&Utc::now())? } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn link_quiz(&self, project_id: &str, quiz_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "projectId": project_id },
                doc! {
                    "$addToSet": { "quizIds": quiz_id },
                    "$set": { "quizGenerated": true, "updatedAt": to_bson(&Utc::now())? },
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
