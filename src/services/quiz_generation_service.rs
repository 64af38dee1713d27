use std::{future::Future, sync::Arc, time::Duration};

use validator::Validate;

use crate::{
    auth::require_owner,
    config::Config,
    errors::{AppError, AppResult},
    extraction::{extract_text, DocumentFormat},
    generation::{
        GenerationService, GenerationServiceError, PromptBuilder, PromptError, ResponseValidator,
    },
    models::domain::{Quiz, QuizConfig, QuizQuestion},
    repositories::{ProjectRepository, QuizRepository},
    storage::{BlobStore, KnowledgeLocation, StorageError},
};

const DEFAULT_LINK_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Turns a project's knowledge document into a persisted, linked quiz.
///
/// Stateless per call. The only writes are the quiz record and the append to
/// the project's `quizIds`, sequenced so that a quiz is never left unlinked:
/// it is written `Pending`, linked, then marked `Ready`. The quiz is deleted
/// only when its project is gone; a link whose outcome is unknown leaves it
/// `Pending` for the reconciler.
pub struct QuizGenerationService {
    project_repository: Arc<dyn ProjectRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
    blob_store: Arc<dyn BlobStore>,
    generation_service: Arc<dyn GenerationService>,
    storage_bucket: String,
    prompt_builder: PromptBuilder,
    validator: ResponseValidator,
    generation_timeout: Duration,
    link_retry_attempts: u32,
    link_retry_delay: Duration,
}

impl QuizGenerationService {
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        blob_store: Arc<dyn BlobStore>,
        generation_service: Arc<dyn GenerationService>,
        config: &Config,
    ) -> Self {
        Self {
            project_repository,
            quiz_repository,
            blob_store,
            generation_service,
            storage_bucket: config.storage_bucket.clone(),
            prompt_builder: PromptBuilder::new(config.max_source_chars),
            validator: ResponseValidator,
            generation_timeout: config.generation_timeout(),
            link_retry_attempts: config.link_retry_attempts.max(1),
            link_retry_delay: DEFAULT_LINK_RETRY_DELAY,
        }
    }

    pub fn with_link_retry_delay(mut self, delay: Duration) -> Self {
        self.link_retry_delay = delay;
        self
    }

    pub async fn generate_quiz(
        &self,
        caller: Option<&str>,
        project_id: &str,
        config: &QuizConfig,
    ) -> AppResult<String> {
        let caller = caller.ok_or(AppError::Unauthenticated)?;
        config.validate()?;

        let project = self
            .project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", project_id)))?;
        require_owner(caller, &project.user_id)?;

        let url = project.source_url().ok_or(AppError::MissingKnowledge)?;

        log::info!(
            "Generating {} {} question(s) for project {}",
            config.number_of_questions,
            config.difficulty,
            project_id
        );

        let text = self.load_source_text(project_id, url).await?;
        let questions = self.generate_questions(project_id, &text, config).await?;
        let quiz_id = self.persist(project_id, config, questions).await?;

        log::info!("Quiz {} generated for project {}", quiz_id, project_id);
        Ok(quiz_id)
    }

    /// Runs [`Self::generate_quiz`] on its own task so the work completes even
    /// if the caller goes away. The caller waits at most `request_timeout`.
    pub async fn generate_quiz_detached(
        self: Arc<Self>,
        caller: Option<String>,
        project_id: String,
        config: QuizConfig,
        request_timeout: Duration,
    ) -> AppResult<String> {
        let service = self;
        let task_project_id = project_id.clone();
        let handle = tokio::spawn(async move {
            service
                .generate_quiz(caller.as_deref(), &task_project_id, &config)
                .await
        });

        match tokio::time::timeout(request_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                log::error!("Quiz generation task for project {} failed: {}", project_id, e);
                Err(AppError::generation_failed())
            }
            Err(_) => {
                log::warn!(
                    "Quiz generation for project {} exceeded {}s; continuing in background",
                    project_id,
                    request_timeout.as_secs()
                );
                Err(AppError::generation_failed())
            }
        }
    }

    async fn load_source_text(&self, project_id: &str, url: &str) -> AppResult<String> {
        let location = KnowledgeLocation::parse_in_bucket(url, &self.storage_bucket).map_err(|e| {
            log::error!("Project {} has an unusable knowledge URL: {}", project_id, e);
            AppError::generation_failed()
        })?;

        let bytes = self
            .blob_store
            .download(location.path())
            .await
            .map_err(|e| match e {
                StorageError::TooLarge { size, limit, .. } => AppError::DocumentTooLarge(format!(
                    "document is {} bytes, limit is {}",
                    size, limit
                )),
                other => {
                    log::error!(
                        "Failed to download knowledge document for project {}: {}",
                        project_id,
                        other
                    );
                    AppError::generation_failed()
                }
            })?;

        let format = DocumentFormat::from_path(location.file_name());
        let text = extract_text(bytes, format).await.map_err(|e| {
            log::warn!(
                "Text extraction failed for project {} ({:?}): {}",
                project_id,
                format,
                e
            );
            AppError::generation_failed()
        })?;

        log::debug!(
            "Extracted {} chars of {:?} text for project {}",
            text.len(),
            format,
            project_id
        );
        Ok(text)
    }

    async fn generate_questions(
        &self,
        project_id: &str,
        text: &str,
        config: &QuizConfig,
    ) -> AppResult<Vec<QuizQuestion>> {
        let request = self
            .prompt_builder
            .build_request(text, config)
            .map_err(|e| match e {
                PromptError::SourceTooLarge { chars, limit } => AppError::DocumentTooLarge(format!(
                    "document has {} characters, limit is {}",
                    chars, limit
                )),
                PromptError::EmptySource => {
                    log::warn!("Knowledge document for project {} has no text", project_id);
                    AppError::generation_failed()
                }
            })?;

        let raw = tokio::time::timeout(self.generation_timeout, self.generation_service.generate(&request))
            .await
            .unwrap_or(Err(GenerationServiceError::Timeout(
                self.generation_timeout.as_secs(),
            )))
            .map_err(|e| {
                log::error!("Generation service failed for project {}: {}", project_id, e);
                AppError::generation_failed()
            })?;

        self.validator
            .validate(&raw, config.question_count())
            .map_err(|e| {
                log::warn!(
                    "Generation output for project {} rejected: {}",
                    project_id,
                    e
                );
                AppError::generation_failed()
            })
    }

    async fn persist(
        &self,
        project_id: &str,
        config: &QuizConfig,
        questions: Vec<QuizQuestion>,
    ) -> AppResult<String> {
        let quiz = Quiz::new_pending(project_id, config.clone(), questions);
        let quiz_id = quiz.quiz_id.clone();

        self.quiz_repository.create(quiz).await.map_err(|e| {
            log::error!("Failed to store quiz for project {}: {}", project_id, e);
            AppError::generation_failed()
        })?;

        let linked = self
            .with_retries("link quiz", &quiz_id, || {
                self.project_repository.link_quiz(project_id, &quiz_id)
            })
            .await;

        match linked {
            WriteOutcome::Applied => {}
            WriteOutcome::Missing => {
                self.compensate(project_id, &quiz_id).await;
                return Err(AppError::generation_failed());
            }
            WriteOutcome::Unknown => {
                // The last write may have landed without an acknowledgement.
                log::error!(
                    "Link state of quiz {} to project {} is unknown; left pending for reconciliation",
                    quiz_id,
                    project_id
                );
                return Err(AppError::generation_failed());
            }
        }

        let ready = self
            .with_retries("mark quiz ready", &quiz_id, || {
                self.quiz_repository.mark_ready(&quiz_id)
            })
            .await;
        if ready != WriteOutcome::Applied {
            log::warn!("Quiz {} is linked but still pending", quiz_id);
        }

        Ok(quiz_id)
    }

    /// Deletes a quiz whose project vanished before it could be linked.
    async fn compensate(&self, project_id: &str, quiz_id: &str) {
        match self.quiz_repository.delete(quiz_id).await {
            Ok(_) => log::warn!(
                "Rolled back quiz {} because project {} no longer exists",
                quiz_id,
                project_id
            ),
            Err(e) => log::error!(
                "Could not roll back quiz {} for project {}: {}; left pending for reconciliation",
                quiz_id,
                project_id,
                e
            ),
        }
    }

    /// Retries `op` with exponential backoff while it errors. `Ok(false)`
    /// means the target record is gone and is not retried.
    async fn with_retries<F, Fut>(&self, what: &str, quiz_id: &str, mut op: F) -> WriteOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<bool>>,
    {
        let mut delay = self.link_retry_delay;
        for attempt in 1..=self.link_retry_attempts {
            match op().await {
                Ok(true) => return WriteOutcome::Applied,
                Ok(false) => {
                    log::warn!("Cannot {} {}: record no longer exists", what, quiz_id);
                    return WriteOutcome::Missing;
                }
                Err(e) => {
                    log::warn!(
                        "Attempt {}/{} to {} {} failed: {}",
                        attempt,
                        self.link_retry_attempts,
                        what,
                        quiz_id,
                        e
                    );
                    if attempt < self.link_retry_attempts {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        WriteOutcome::Unknown
    }
}

/// Result of a retried write against a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Applied,
    /// The record matched nothing.
    Missing,
    /// Every attempt errored; the write may or may not have been applied.
    Unknown,
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::{
        generation::MockGenerationService,
        models::domain::{Difficulty, Project, QuizStatus},
        services::QuizReconciler,
        storage::MockBlobStore,
        test_utils::{
            fixtures::{knowledge_url, project_with_knowledge, questions_json, OWNER},
            InMemoryProjectRepository, InMemoryQuizRepository,
        },
    };

    const TEXT_PATH: &str = "project-knowledge/owner-1/1700000000000-notes.txt";

    struct Harness {
        projects: Arc<InMemoryProjectRepository>,
        quizzes: Arc<InMemoryQuizRepository>,
        service: QuizGenerationService,
    }

    fn harness(
        projects: Vec<Project>,
        blob_store: MockBlobStore,
        generation: MockGenerationService,
    ) -> Harness {
        let projects = Arc::new(InMemoryProjectRepository::with_projects(projects));
        let quizzes = Arc::new(InMemoryQuizRepository::new());
        let service = QuizGenerationService::new(
            projects.clone(),
            quizzes.clone(),
            Arc::new(blob_store),
            Arc::new(generation),
            &Config::test_config(),
        )
        .with_link_retry_delay(Duration::from_millis(1));

        Harness {
            projects,
            quizzes,
            service,
        }
    }

    fn text_blob_store() -> MockBlobStore {
        let mut store = MockBlobStore::new();
        store
            .expect_download()
            .with(eq(TEXT_PATH))
            .returning(|_| Ok(b"Cells are the basic unit of life.\n\nMitochondria make ATP.".to_vec()));
        store
    }

    fn answering(count: usize) -> MockGenerationService {
        let mut generation = MockGenerationService::new();
        generation
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(questions_json(count)));
        generation
    }

    fn untouched_generation() -> MockGenerationService {
        let mut generation = MockGenerationService::new();
        generation.expect_generate().never();
        generation
    }

    fn easy(count: u32) -> QuizConfig {
        QuizConfig::new(Difficulty::Easy, count)
    }

    #[tokio::test]
    async fn generates_links_and_readies_quiz() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));

        let quiz_id = h
            .service
            .generate_quiz(Some(OWNER), &project_id, &easy(5))
            .await
            .expect("generation should succeed");

        let quiz = h.quizzes.get(&quiz_id).await.expect("quiz stored");
        assert_eq!(quiz.status, QuizStatus::Ready);
        assert_eq!(quiz.questions.len(), 5);
        assert_eq!(quiz.project_id, project_id);
        assert!(quiz.results.is_empty());

        let project = h.projects.get(&project_id).await.expect("project");
        assert_eq!(project.quiz_ids, vec![quiz_id]);
        assert!(project.quiz_generated);
    }

    #[tokio::test]
    async fn prompt_carries_config_and_source_text() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();

        let mut generation = MockGenerationService::new();
        generation
            .expect_generate()
            .withf(|request| {
                request.prompt.contains("Difficulty level: Hard")
                    && request.prompt.contains("exactly 7 questions")
                    && request.prompt.contains("Mitochondria make ATP.")
            })
            .times(1)
            .returning(|_| Ok(questions_json(7)));

        let h = harness(vec![project], text_blob_store(), generation);
        let result = h
            .service
            .generate_quiz(Some(OWNER), &project_id, &QuizConfig::new(Difficulty::Hard, 7))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn anonymous_caller_is_unauthenticated() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], MockBlobStore::new(), untouched_generation());

        let result = h.service.generate_quiz(None, &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let h = harness(vec![], MockBlobStore::new(), untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), "missing", &easy(5)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn other_user_is_forbidden_and_nothing_is_written() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], MockBlobStore::new(), untouched_generation());

        let result = h
            .service
            .generate_quiz(Some("intruder"), &project_id, &easy(5))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn missing_knowledge_leaves_project_untouched() {
        let mut project = project_with_knowledge(OWNER, "");
        project.knowledge_url = None;
        let before = project.clone();
        let h = harness(vec![project], MockBlobStore::new(), untouched_generation());

        let result = h
            .service
            .generate_quiz(Some(OWNER), &before.project_id, &easy(5))
            .await;

        assert!(matches!(result, Err(AppError::MissingKnowledge)));
        assert_eq!(h.projects.get(&before.project_id).await, Some(before));
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_work() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], MockBlobStore::new(), untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(2)).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn malformed_knowledge_url_fails_without_download() {
        let project = project_with_knowledge(OWNER, "https://storage.example.com/files/notes.txt");
        let project_id = project.project_id.clone();
        let mut store = MockBlobStore::new();
        store.expect_download().never();
        let h = harness(vec![project], store, untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn knowledge_in_foreign_bucket_is_never_downloaded() {
        let url = crate::storage::object_url(
            "https://storage.example.com",
            "someone-elses-bucket",
            TEXT_PATH,
        );
        let project = project_with_knowledge(OWNER, &url);
        let project_id = project.project_id.clone();
        let mut store = MockBlobStore::new();
        store.expect_download().never();
        let h = harness(vec![project], store, untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn corrupt_pdf_surfaces_generic_failure() {
        let path = "project-knowledge/owner-1/1-slides.pdf";
        let project = project_with_knowledge(OWNER, &knowledge_url(path));
        let project_id = project.project_id.clone();
        let mut store = MockBlobStore::new();
        store
            .expect_download()
            .returning(|_| Ok(b"this is not a pdf".to_vec()));
        let h = harness(vec![project], store, untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        match result {
            Err(AppError::GenerationFailed(message)) => {
                assert_eq!(message, crate::errors::GENERATION_FAILED_MESSAGE)
            }
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_document_fails_generation() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let mut store = MockBlobStore::new();
        store.expect_download().returning(|_| Ok(b"  \n\n ".to_vec()));
        let h = harness(vec![project], store, untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn oversized_source_is_reported_to_caller() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let mut store = MockBlobStore::new();
        store
            .expect_download()
            .returning(|_| Ok("word ".repeat(5_000).into_bytes()));
        let h = harness(vec![project], store, untouched_generation());

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::DocumentTooLarge(_))));
    }

    #[tokio::test]
    async fn service_error_is_not_retried() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let mut generation = MockGenerationService::new();
        generation
            .expect_generate()
            .times(1)
            .returning(|_| Err(GenerationServiceError::Api("quota exceeded".to_string())));
        let h = harness(vec![project], text_blob_store(), generation);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn schema_violation_persists_nothing() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let mut generation = MockGenerationService::new();
        generation.expect_generate().returning(|_| {
            let mut value: serde_json::Value =
                serde_json::from_str(&questions_json(5)).expect("fixture json");
            value["questions"][2]["options"] = serde_json::json!(["A", "B", "C"]);
            Ok(value.to_string())
        });
        let h = harness(vec![project], text_blob_store(), generation);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert!(h.quizzes.all().await.is_empty());
        assert!(!h.projects.get(&project_id).await.expect("project").quiz_generated);
    }

    #[tokio::test]
    async fn question_count_mismatch_is_rejected() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(4));

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn transient_link_failure_is_retried() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        h.projects.fail_next_links(2);

        let quiz_id = h
            .service
            .generate_quiz(Some(OWNER), &project_id, &easy(5))
            .await
            .expect("third link attempt succeeds");

        let project = h.projects.get(&project_id).await.expect("project");
        assert_eq!(project.quiz_ids, vec![quiz_id.clone()]);
        assert!(h.quizzes.get(&quiz_id).await.expect("quiz").is_ready());
    }

    fn reconciler(h: &Harness) -> QuizReconciler {
        QuizReconciler::new(h.projects.clone(), h.quizzes.clone(), 0)
    }

    #[tokio::test]
    async fn persistent_link_failure_leaves_quiz_pending_for_reconciler() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        h.projects.fail_next_links(3);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        let quizzes = h.quizzes.all().await;
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].status, QuizStatus::Pending);
        assert!(h.projects.get(&project_id).await.expect("project").quiz_ids.is_empty());

        let report = reconciler(&h).run_once().await.expect("reconcile");

        assert_eq!(report.linked, 1);
        let quiz_id = quizzes[0].quiz_id.clone();
        assert!(h.quizzes.get(&quiz_id).await.expect("quiz").is_ready());
        assert_eq!(
            h.projects.get(&project_id).await.expect("project").quiz_ids,
            vec![quiz_id]
        );
    }

    #[tokio::test]
    async fn link_applied_without_acknowledgement_is_not_rolled_back() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        h.projects.lose_next_link_acks(3);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        let quizzes = h.quizzes.all().await;
        assert_eq!(quizzes.len(), 1);
        let quiz_id = quizzes[0].quiz_id.clone();
        assert_eq!(quizzes[0].status, QuizStatus::Pending);
        let project = h.projects.get(&project_id).await.expect("project");
        assert_eq!(project.quiz_ids, vec![quiz_id.clone()]);

        reconciler(&h).run_once().await.expect("reconcile");

        assert!(h.quizzes.get(&quiz_id).await.expect("quiz").is_ready());
        assert_eq!(
            h.projects.get(&project_id).await.expect("project").quiz_ids,
            vec![quiz_id]
        );
    }

    #[tokio::test]
    async fn project_deleted_before_link_rolls_back_quiz() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        h.projects.vanish_on_link(true);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn failed_rollback_leaves_pending_quiz_for_reconciler() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        h.projects.vanish_on_link(true);
        h.quizzes.fail_deletes(true);

        let result = h.service.generate_quiz(Some(OWNER), &project_id, &easy(5)).await;

        assert!(result.is_err());
        let quizzes = h.quizzes.all().await;
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].status, QuizStatus::Pending);

        h.quizzes.fail_deletes(false);
        let report = reconciler(&h).run_once().await.expect("reconcile");

        assert_eq!(report.deleted, 1);
        assert!(h.quizzes.all().await.is_empty());
    }

    #[tokio::test]
    async fn detached_generation_returns_result() {
        let project = project_with_knowledge(OWNER, &knowledge_url(TEXT_PATH));
        let project_id = project.project_id.clone();
        let h = harness(vec![project], text_blob_store(), answering(5));
        let service = Arc::new(h.service);

        let quiz_id = service
            .generate_quiz_detached(
                Some(OWNER.to_string()),
                project_id.clone(),
                easy(5),
                Duration::from_secs(5),
            )
            .await
            .expect("generation");

        assert_eq!(
            h.projects.get(&project_id).await.expect("project").quiz_ids,
            vec![quiz_id]
        );
    }
}
