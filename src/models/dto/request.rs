use async_graphql::InputObject;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::QuizConfig;

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    #[graphql(default)]
    pub description: String,
}

/// The caller-facing `generateQuiz` payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, message = "projectId is required"))]
    pub project_id: String,

    #[validate(nested)]
    pub config: QuizConfig,
}

/// Body of `POST /api/projects/{id}/quizzes`, where the project id comes
/// from the path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizBody {
    #[validate(nested)]
    pub config: QuizConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, InputObject)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_index: u32,
    #[validate(range(max = 3))]
    pub selected_answer: u8,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct SubmitQuizResultRequest {
    #[validate(length(min = 1, message = "at least one answer is required"), nested)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadKnowledgeQuery {
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::Difficulty;

    #[test]
    fn generate_quiz_request_parses_caller_payload() {
        let request: GenerateQuizRequest = serde_json::from_str(
            r#"{"projectId":"p-1","config":{"difficulty":"Easy","numberOfQuestions":5}}"#,
        )
        .expect("payload should parse");

        assert_eq!(request.project_id, "p-1");
        assert_eq!(request.config.difficulty, Difficulty::Easy);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn generate_quiz_request_validates_nested_config() {
        let request: GenerateQuizRequest = serde_json::from_str(
            r#"{"projectId":"p-1","config":{"difficulty":"Hard","numberOfQuestions":500}}"#,
        )
        .expect("payload should parse");

        assert!(request.validate().is_err());
    }

    #[test]
    fn submit_result_requires_answers_in_range() {
        let empty = SubmitQuizResultRequest { answers: vec![] };
        assert!(empty.validate().is_err());

        let out_of_range = SubmitQuizResultRequest {
            answers: vec![SubmittedAnswer {
                question_index: 0,
                selected_answer: 4,
            }],
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn submit_result_reports_the_offending_answer() {
        let request: SubmitQuizResultRequest = serde_json::from_str(
            r#"{"answers":[{"questionIndex":0,"selectedAnswer":2},{"questionIndex":1,"selectedAnswer":7}]}"#,
        )
        .expect("payload should parse");

        let errors = request.validate().expect_err("second answer is out of range");
        match errors.errors().get("answers") {
            Some(validator::ValidationErrorsKind::List(items)) => {
                assert!(!items.contains_key(&0));
                assert!(items.contains_key(&1));
            }
            other => panic!("expected per-answer errors, got {:?}", other),
        }

        let valid: SubmitQuizResultRequest = serde_json::from_str(
            r#"{"answers":[{"questionIndex":0,"selectedAnswer":3}]}"#,
        )
        .expect("payload should parse");
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn create_project_requires_name() {
        let request = CreateProjectRequest {
            name: String::new(),
            description: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
