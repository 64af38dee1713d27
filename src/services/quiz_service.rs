use std::{collections::HashSet, sync::Arc};

use validator::Validate;

use crate::{
    auth::require_owner,
    errors::{AppError, AppResult},
    models::{
        domain::{AnswerRecord, Project, Quiz, QuizResult},
        dto::request::{SubmitQuizResultRequest, SubmittedAnswer},
    },
    repositories::{ProjectRepository, QuizRepository},
};

/// Read access to generated quizzes and the result log. Quizzes are visible
/// only to the owner of their parent project and only once linked.
pub struct QuizService {
    project_repository: Arc<dyn ProjectRepository>,
    quiz_repository: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        quiz_repository: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            project_repository,
            quiz_repository,
        }
    }

    pub async fn get_quiz(&self, caller: &str, quiz_id: &str) -> AppResult<Quiz> {
        let not_found = || AppError::NotFound(format!("Quiz '{}' not found", quiz_id));

        let quiz = self
            .quiz_repository
            .find_by_id(quiz_id)
            .await?
            .filter(Quiz::is_ready)
            .ok_or_else(not_found)?;

        let project = self
            .project_repository
            .find_by_id(&quiz.project_id)
            .await?
            .ok_or_else(not_found)?;
        require_owner(caller, &project.user_id)?;

        Ok(quiz)
    }

    /// Quizzes of a project, in the order they were linked.
    pub async fn list_project_quizzes(&self, caller: &str, project_id: &str) -> AppResult<Vec<Quiz>> {
        let project = self.owned_project(caller, project_id).await?;

        let mut quizzes: Vec<Quiz> = self
            .quiz_repository
            .list_ready_by_project(project_id)
            .await?
            .into_iter()
            .filter(|quiz| project.quiz_ids.contains(&quiz.quiz_id))
            .collect();
        quizzes.sort_by_key(|quiz| {
            project
                .quiz_ids
                .iter()
                .position(|id| *id == quiz.quiz_id)
                .unwrap_or(usize::MAX)
        });

        Ok(quizzes)
    }

    /// Grades one answer per question and appends the result to the quiz.
    pub async fn submit_result(
        &self,
        caller: &str,
        quiz_id: &str,
        request: SubmitQuizResultRequest,
    ) -> AppResult<QuizResult> {
        request.validate()?;

        let quiz = self.get_quiz(caller, quiz_id).await?;
        let answers = grade(&quiz, &request.answers)?;
        let result = QuizResult::new(caller, answers);

        if !self.quiz_repository.push_result(quiz_id, &result).await? {
            return Err(AppError::NotFound(format!("Quiz '{}' not found", quiz_id)));
        }

        log::info!(
            "Recorded result {}% for quiz {} by user {}",
            result.score,
            quiz_id,
            caller
        );
        Ok(result)
    }

    async fn owned_project(&self, caller: &str, project_id: &str) -> AppResult<Project> {
        let project = self
            .project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", project_id)))?;
        require_owner(caller, &project.user_id)?;
        Ok(project)
    }
}

fn grade(quiz: &Quiz, submitted: &[SubmittedAnswer]) -> AppResult<Vec<AnswerRecord>> {
    if submitted.len() != quiz.questions.len() {
        return Err(AppError::ValidationError(format!(
            "expected {} answers, got {}",
            quiz.questions.len(),
            submitted.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut records: Vec<AnswerRecord> = submitted
        .iter()
        .map(|answer| {
            let index = answer.question_index as usize;
            let question = quiz.questions.get(index).ok_or_else(|| {
                AppError::ValidationError(format!("questionIndex {} is out of range", index))
            })?;
            if !seen.insert(index) {
                return Err(AppError::ValidationError(format!(
                    "questionIndex {} answered more than once",
                    index
                )));
            }
            Ok(AnswerRecord {
                question_index: answer.question_index,
                selected_answer: answer.selected_answer,
                is_correct: question.is_correct(answer.selected_answer),
            })
        })
        .collect::<AppResult<_>>()?;

    records.sort_by_key(|record| record.question_index);
    Ok(records)
}
