use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Project, Quiz, QuizResult, QuizStatus},
    repositories::{ProjectRepository, QuizRepository},
};

pub mod fixtures {
    use serde_json::json;

    use crate::{
        models::domain::{Explanation, Project, QuizQuestion},
        storage::object_url,
    };

    pub const OWNER: &str = "owner-1";
    pub const STORAGE_BASE: &str = "https://storage.example.com";
    pub const BUCKET: &str = "test-bucket";

    pub fn knowledge_url(path: &str) -> String {
        object_url(STORAGE_BASE, BUCKET, path)
    }

    pub fn project_with_knowledge(owner: &str, url: &str) -> Project {
        let mut project = Project::new(owner, "Biology", "Cell biology notes");
        project.knowledge_url = Some(url.to_string());
        project
    }

    /// A well-formed generation response envelope with `count` questions.
    pub fn questions_json(count: usize) -> String {
        let questions: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "questionText": format!("What does passage {} state?", i + 1),
                    "options": ["Option A", "Option B", "Option C", "Option D"],
                    "correctAnswerIndex": i % 4,
                    "explanation": {
                        "reason": format!("Passage {} states it directly.", i + 1),
                        "references": [format!("passage {}", i + 1)]
                    }
                })
            })
            .collect();
        json!({ "questions": questions }).to_string()
    }

    pub fn sample_questions(count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|i| QuizQuestion {
                question_text: format!("Question {}?", i + 1),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer_index: (i % 4) as u8,
                explanation: Explanation {
                    reason: "Stated in the notes.".to_string(),
                    references: vec![],
                },
            })
            .collect()
    }
}

/// Project store with injectable link failures.
#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<HashMap<String, Project>>>,
    failing_links: AtomicU32,
    unacknowledged_links: AtomicU32,
    vanish_on_link: AtomicBool,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let map = projects
            .into_iter()
            .map(|p| (p.project_id.clone(), p))
            .collect();
        Self {
            projects: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// The next `count` calls to `link_quiz` fail with a database error.
    pub fn fail_next_links(&self, count: u32) {
        self.failing_links.store(count, Ordering::SeqCst);
    }

    /// The next `count` calls to `link_quiz` apply the link and then report
    /// a database error, like a write whose acknowledgement was lost.
    pub fn lose_next_link_acks(&self, count: u32) {
        self.unacknowledged_links.store(count, Ordering::SeqCst);
    }

    /// The project is deleted just before the next `link_quiz` runs.
    pub fn vanish_on_link(&self, vanish: bool) {
        self.vanish_on_link.store(vanish, Ordering::SeqCst);
    }

    pub async fn get(&self, project_id: &str) -> Option<Project> {
        self.projects.read().await.get(project_id).cloned()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn find_by_id(&self, project_id: &str) -> AppResult<Option<Project>> {
        Ok(self.get(project_id).await)
    }

    async fn create(&self, project: Project) -> AppResult<Project> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.project_id) {
            return Err(AppError::DatabaseError(format!(
                "duplicate projectId '{}'",
                project.project_id
            )));
        }
        projects.insert(project.project_id.clone(), project.clone());
        Ok(project)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Project>> {
        let projects = self.projects.read().await;
        let mut items: Vec<_> = projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn set_knowledge_url(&self, project_id: &str, url: &str) -> AppResult<bool> {
        let mut projects = self.projects.write().await;
        let Some(project) = projects.get_mut(project_id) else {
            return Ok(false);
        };
        project.knowledge_url = Some(url.to_string());
        project.updated_at = Utc::now();
        Ok(true)
    }

    async fn link_quiz(&self, project_id: &str, quiz_id: &str) -> AppResult<bool> {
        let pending_failures = self.failing_links.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_links.store(pending_failures - 1, Ordering::SeqCst);
            return Err(AppError::DatabaseError("simulated write failure".to_string()));
        }

        let mut projects = self.projects.write().await;
        if self.vanish_on_link.swap(false, Ordering::SeqCst) {
            projects.remove(project_id);
        }
        let Some(project) = projects.get_mut(project_id) else {
            return Ok(false);
        };
        project.link_quiz(quiz_id);

        let lost_acks = self.unacknowledged_links.load(Ordering::SeqCst);
        if lost_acks > 0 {
            self.unacknowledged_links.store(lost_acks - 1, Ordering::SeqCst);
            return Err(AppError::DatabaseError("simulated lost acknowledgement".to_string()));
        }
        Ok(true)
    }
}

/// Quiz store with injectable delete failures.
#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
    failing_deletes: AtomicBool,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.failing_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn insert(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.quiz_id.clone(), quiz);
    }

    pub async fn get(&self, quiz_id: &str) -> Option<Quiz> {
        self.quizzes.read().await.get(quiz_id).cloned()
    }

    pub async fn all(&self) -> Vec<Quiz> {
        self.quizzes.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, quiz_id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.get(quiz_id).await)
    }

    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if quizzes.contains_key(&quiz.quiz_id) {
            return Err(AppError::DatabaseError(format!(
                "duplicate quizId '{}'",
                quiz.quiz_id
            )));
        }
        quizzes.insert(quiz.quiz_id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn mark_ready(&self, quiz_id: &str) -> AppResult<bool> {
        let mut quizzes = self.quizzes.write().await;
        let Some(quiz) = quizzes.get_mut(quiz_id) else {
            return Ok(false);
        };
        quiz.status = QuizStatus::Ready;
        Ok(true)
    }

    async fn delete(&self, quiz_id: &str) -> AppResult<bool> {
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("simulated delete failure".to_string()));
        }
        Ok(self.quizzes.write().await.remove(quiz_id).is_some())
    }

    async fn list_ready_by_project(&self, project_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .filter(|q| q.project_id == project_id && q.is_ready())
            .cloned()
            .collect())
    }

    async fn find_pending_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .filter(|q| q.status == QuizStatus::Pending && q.generated_at <= cutoff)
            .cloned()
            .collect())
    }

    async fn push_result(&self, quiz_id: &str, result: &QuizResult) -> AppResult<bool> {
        let mut quizzes = self.quizzes.write().await;
        let Some(quiz) = quizzes.get_mut(quiz_id) else {
            return Ok(false);
        };
        quiz.results.push(result.clone());
        Ok(true)
    }
}
