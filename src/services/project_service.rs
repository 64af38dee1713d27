use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::require_owner,
    errors::{AppError, AppResult},
    extraction::DocumentFormat,
    models::{
        domain::Project,
        dto::{request::CreateProjectRequest, response::UploadKnowledgeResponse},
    },
    repositories::ProjectRepository,
    storage::{sanitize_file_name, BlobStore},
};

pub const KNOWLEDGE_PREFIX: &str = "project-knowledge";

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    blob_store: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
}

impl ProjectService {
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        blob_store: Arc<dyn BlobStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            repository,
            blob_store,
            max_upload_bytes,
        }
    }

    pub async fn create_project(&self, caller: &str, request: CreateProjectRequest) -> AppResult<Project> {
        request.validate()?;

        let project = Project::new(caller, request.name.trim(), request.description.trim());
        let project = self.repository.create(project).await?;

        log::info!("Created project {} for user {}", project.project_id, caller);
        Ok(project)
    }

    pub async fn get_project(&self, caller: &str, project_id: &str) -> AppResult<Project> {
        let project = self
            .repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", project_id)))?;

        require_owner(caller, &project.user_id)?;
        Ok(project)
    }

    pub async fn list_projects(&self, caller: &str) -> AppResult<Vec<Project>> {
        self.repository.list_by_user(caller).await
    }

    /// Stores the document under the caller's prefix and points the project's
    /// `knowledgeURL` at it. A later upload replaces the reference.
    pub async fn upload_knowledge(
        &self,
        caller: &str,
        project_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<UploadKnowledgeResponse> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Uploaded document is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::DocumentTooLarge(format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        let project = self.get_project(caller, project_id).await?;

        let file_name = sanitize_file_name(file_name);
        let path = format!(
            "{}/{}/{}-{}",
            KNOWLEDGE_PREFIX,
            project.user_id,
            Utc::now().timestamp_millis(),
            file_name
        );
        let content_type = DocumentFormat::from_path(&file_name).content_type();

        let url = self
            .blob_store
            .upload(&path, bytes, content_type)
            .await
            .map_err(|e| {
                log::error!("Failed to store knowledge for project {}: {}", project_id, e);
                AppError::InternalError(e.to_string())
            })?;

        if !self.repository.set_knowledge_url(project_id, &url).await? {
            return Err(AppError::NotFound(format!("Project '{}' not found", project_id)));
        }

        log::info!("Stored knowledge document {} for project {}", path, project_id);
        Ok(UploadKnowledgeResponse {
            project_id: project_id.to_string(),
            knowledge_url: url,
        })
    }
}
