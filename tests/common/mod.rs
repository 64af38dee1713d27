#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use docquiz_server::{
    app_state::AppState,
    config::Config,
    generation::{GenerationRequest, GenerationService, GenerationServiceError},
    models::domain::Project,
    repositories::ProjectRepository,
    storage::{object_url, BlobStore, StorageError},
    test_utils::{InMemoryProjectRepository, InMemoryQuizRepository},
};

pub const STORAGE_BASE: &str = "https://storage.example.com";
pub const BUCKET: &str = "docquiz-it";

pub const THREE_PARAGRAPHS: &str = "Mitochondria produce most of the cell's ATP through oxidative phosphorylation.\n\n\
The nucleus stores genetic material and coordinates gene expression.\n\n\
Ribosomes translate messenger RNA into polypeptide chains.";

pub fn test_config() -> Config {
    let mut config = Config::from_env();
    config.storage_api_base = STORAGE_BASE.to_string();
    config.storage_bucket = BUCKET.to_string();
    config.storage_local_root = None;
    config.generation_timeout_secs = 5;
    config.request_timeout_secs = 10;
    config.max_source_chars = 10_000;
    config.max_upload_bytes = 64 * 1024;
    config.link_retry_attempts = 3;
    config.pending_quiz_grace_secs = 0;
    config
}

pub fn questions_json(count: usize) -> String {
    let questions: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "questionText": format!("Which statement about paragraph {} is accurate?", i + 1),
                "options": ["Mitochondria", "Nucleus", "Ribosome", "Golgi apparatus"],
                "correctAnswerIndex": i % 4,
                "explanation": {
                    "reason": "The source states it directly.",
                    "references": [format!("paragraph {}", i % 3 + 1)]
                }
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Stores `bytes` and returns the knowledge URL pointing at them.
    pub async fn put(&self, path: &str, bytes: &[u8]) -> String {
        self.objects
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        self.download_url(path)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Ok(self.put(path, &bytes).await)
    }

    fn download_url(&self, path: &str) -> String {
        object_url(STORAGE_BASE, BUCKET, path)
    }
}

/// Answers every request with `questions_json(count)` and records prompts.
pub struct ScriptedGenerator {
    count: usize,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationServiceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(questions_json(self.count))
    }
}

pub struct Harness {
    pub projects: Arc<InMemoryProjectRepository>,
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub state: AppState,
}

impl Harness {
    pub fn new(generated_questions: usize) -> Self {
        let projects = Arc::new(InMemoryProjectRepository::new());
        let quizzes = Arc::new(InMemoryQuizRepository::new());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let generator = Arc::new(ScriptedGenerator::new(generated_questions));
        let state = AppState::from_parts(
            test_config(),
            projects.clone(),
            quizzes.clone(),
            blobs.clone(),
            generator.clone(),
            None,
        );
        Self {
            projects,
            quizzes,
            blobs,
            generator,
            state,
        }
    }

    /// A project owned by `owner` whose knowledge document holds `text`.
    pub async fn project_with_text(&self, owner: &str, text: &str) -> Project {
        let mut project = Project::new(owner, "Cell biology", "Week 1");
        let path = format!("project-knowledge/{}/1700000000000-notes.txt", owner);
        project.knowledge_url = Some(self.blobs.put(&path, text.as_bytes()).await);
        self.insert_project(project.clone()).await;
        project
    }

    pub async fn insert_project(&self, project: Project) {
        self.projects.create(project).await.expect("insert project");
    }
}
