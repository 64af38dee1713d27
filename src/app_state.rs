use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    generation::{GenerationService, OpenAiGenerationService},
    repositories::{MongoProjectRepository, MongoQuizRepository, ProjectRepository, QuizRepository},
    services::{ProjectService, QuizGenerationService, QuizReconciler, QuizService},
    storage::{BlobStore, HttpBlobStore, LocalBlobStore},
};

#[derive(Clone)]
pub struct AppState {
    pub project_service: Arc<ProjectService>,
    pub quiz_service: Arc<QuizService>,
    pub quiz_generation_service: Arc<QuizGenerationService>,
    pub quiz_reconciler: Arc<QuizReconciler>,
    /// `None` when the state was assembled without a database connection.
    pub database: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let project_repository = Arc::new(MongoProjectRepository::new(&db));
        project_repository.ensure_indexes().await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let blob_store: Arc<dyn BlobStore> = match &config.storage_local_root {
            Some(root) => {
                log::info!("Serving knowledge documents from {}", root.display());
                Arc::new(LocalBlobStore::new(
                    root.clone(),
                    &config.storage_api_base,
                    &config.storage_bucket,
                ))
            }
            None => Arc::new(HttpBlobStore::new(
                &config.storage_api_base,
                &config.storage_bucket,
                config.storage_access_token.clone(),
                config.max_upload_bytes,
            )),
        };

        let generation_service = Arc::new(OpenAiGenerationService::new(
            &config.openai_api_key,
            &config.openai_api_base,
            config.openai_model.clone(),
        ));

        Ok(Self::from_parts(
            config,
            project_repository,
            quiz_repository,
            blob_store,
            generation_service,
            Some(db),
        ))
    }

    /// Assembles the services over the given backends.
    pub fn from_parts(
        config: Config,
        project_repository: Arc<dyn ProjectRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        blob_store: Arc<dyn BlobStore>,
        generation_service: Arc<dyn GenerationService>,
        database: Option<Database>,
    ) -> Self {
        let project_service = Arc::new(ProjectService::new(
            project_repository.clone(),
            blob_store.clone(),
            config.max_upload_bytes,
        ));
        let quiz_service = Arc::new(QuizService::new(
            project_repository.clone(),
            quiz_repository.clone(),
        ));
        let quiz_generation_service = Arc::new(QuizGenerationService::new(
            project_repository.clone(),
            quiz_repository.clone(),
            blob_store,
            generation_service,
            &config,
        ));
        let quiz_reconciler = Arc::new(QuizReconciler::new(
            project_repository,
            quiz_repository,
            config.pending_quiz_grace_secs,
        ));

        Self {
            project_service,
            quiz_service,
            quiz_generation_service,
            quiz_reconciler,
            database,
            config: Arc::new(config),
        }
    }
}
