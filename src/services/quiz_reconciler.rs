use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::{
    errors::AppResult,
    repositories::{ProjectRepository, QuizRepository},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub linked: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Resolves quizzes left `Pending` by an interrupted generation: links them
/// if the parent project still exists, deletes them otherwise. Linking is an
/// idempotent add-to-set, so a quiz that was linked before the interruption
/// is simply marked ready.
pub struct QuizReconciler {
    project_repository: Arc<dyn ProjectRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
    grace_period: chrono::Duration,
}

impl QuizReconciler {
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
        grace_period_secs: i64,
    ) -> Self {
        Self {
            project_repository,
            quiz_repository,
            grace_period: chrono::Duration::seconds(grace_period_secs.max(0)),
        }
    }

    /// Pending quizzes younger than the grace period may still belong to an
    /// in-flight request and are left alone.
    pub async fn run_once(&self) -> AppResult<ReconcileReport> {
        let cutoff = Utc::now() - self.grace_period;
        let pending = self.quiz_repository.find_pending_before(cutoff).await?;
        let mut report = ReconcileReport::default();

        for quiz in pending {
            let outcome = match self.project_repository.find_by_id(&quiz.project_id).await {
                Ok(Some(_)) => self.link(&quiz.project_id, &quiz.quiz_id).await.map(|linked| {
                    if linked {
                        report.linked += 1;
                    }
                }),
                Ok(None) => self.quiz_repository.delete(&quiz.quiz_id).await.map(|_| {
                    log::warn!(
                        "Deleted pending quiz {}: project {} no longer exists",
                        quiz.quiz_id,
                        quiz.project_id
                    );
                    report.deleted += 1;
                }),
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                report.failed += 1;
                log::error!("Could not reconcile quiz {}: {}", quiz.quiz_id, e);
            }
        }

        if report != ReconcileReport::default() {
            log::info!(
                "Reconciled pending quizzes: {} linked, {} deleted, {} failed",
                report.linked,
                report.deleted,
                report.failed
            );
        }
        Ok(report)
    }

    async fn link(&self, project_id: &str, quiz_id: &str) -> AppResult<bool> {
        if !self.project_repository.link_quiz(project_id, quiz_id).await? {
            return Ok(false);
        }
        self.quiz_repository.mark_ready(quiz_id).await?;
        log::info!("Linked pending quiz {} to project {}", quiz_id, project_id);
        Ok(true)
    }

    /// Runs [`Self::run_once`] every `interval` until the handle is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = self.run_once().await {
                    log::error!("Quiz reconciliation pass failed: {}", e);
                }
            }
        })
    }
}
