//! Shape validation of raw generation output.
//!
//! The service is asked for schema-constrained JSON, but its output is still
//! treated as untrusted: every question is checked field by field and a single
//! bad question rejects the whole batch.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::domain::{
    quiz_question::OPTIONS_PER_QUESTION, Explanation, QuizQuestion,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseValidationError {
    #[error("response is not a parseable question list: {0}")]
    Malformed(String),

    #[error("question {index}: field `{field}` {reason}")]
    SchemaViolation {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("expected {expected} questions, response contained {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl ResponseValidationError {
    fn violation(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        ResponseValidationError::SchemaViolation {
            index,
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    /// Parses `raw` and returns exactly `expected_count` well-formed questions.
    ///
    /// Accepts a bare JSON array or an object with a `questions` array, optionally
    /// wrapped in a markdown code fence.
    pub fn validate(
        &self,
        raw: &str,
        expected_count: usize,
    ) -> Result<Vec<QuizQuestion>, ResponseValidationError> {
        let items = parse_question_list(raw)?;

        if items.len() != expected_count {
            return Err(ResponseValidationError::CountMismatch {
                expected: expected_count,
                actual: items.len(),
            });
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| validate_question(index, item))
            .collect()
    }
}

fn parse_question_list(raw: &str) -> Result<Vec<Value>, ResponseValidationError> {
    let text = strip_code_fence(raw.trim());
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ResponseValidationError::Malformed(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ResponseValidationError::Malformed(
                "`questions` is not an array".to_string(),
            )),
            None => Err(ResponseValidationError::Malformed(
                "object has no `questions` array".to_string(),
            )),
        },
        other => Err(ResponseValidationError::Malformed(format!(
            "expected an array of questions, found {}",
            json_type(&other)
        ))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn validate_question(index: usize, item: &Value) -> Result<QuizQuestion, ResponseValidationError> {
    let object = item.as_object().ok_or_else(|| {
        ResponseValidationError::violation(index, "question", format!("must be an object, found {}", json_type(item)))
    })?;

    let question_text = required_text(index, object, "questionText")?;

    let options = match object.get("options") {
        Some(Value::Array(options)) => options,
        Some(other) => {
            return Err(ResponseValidationError::violation(
                index,
                "options",
                format!("must be an array, found {}", json_type(other)),
            ))
        }
        None => return Err(ResponseValidationError::violation(index, "options", "is missing")),
    };
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(ResponseValidationError::violation(
            index,
            "options",
            format!("must have exactly {OPTIONS_PER_QUESTION} entries, found {}", options.len()),
        ));
    }
    let options = options
        .iter()
        .enumerate()
        .map(|(position, option)| match option.as_str().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(ResponseValidationError::violation(
                index,
                "options",
                format!("entry {position} is empty"),
            )),
            None => Err(ResponseValidationError::violation(
                index,
                "options",
                format!("entry {position} must be a string, found {}", json_type(option)),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let correct_answer_index = match object.get("correctAnswerIndex") {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(i) if (i as usize) < OPTIONS_PER_QUESTION => i as u8,
            _ => {
                return Err(ResponseValidationError::violation(
                    index,
                    "correctAnswerIndex",
                    format!("must be an integer in [0, {}], found {n}", OPTIONS_PER_QUESTION - 1),
                ))
            }
        },
        Some(other) => {
            return Err(ResponseValidationError::violation(
                index,
                "correctAnswerIndex",
                format!("must be an integer, found {}", json_type(other)),
            ))
        }
        None => {
            return Err(ResponseValidationError::violation(
                index,
                "correctAnswerIndex",
                "is missing",
            ))
        }
    };

    let explanation = match object.get("explanation") {
        Some(Value::Object(explanation)) => explanation,
        Some(other) => {
            return Err(ResponseValidationError::violation(
                index,
                "explanation",
                format!("must be an object, found {}", json_type(other)),
            ))
        }
        None => return Err(ResponseValidationError::violation(index, "explanation", "is missing")),
    };

    let reason = required_text(index, explanation, "reason").map_err(|e| match e {
        ResponseValidationError::SchemaViolation { reason, .. } => {
            ResponseValidationError::violation(index, "explanation.reason", reason)
        }
        other => other,
    })?;

    let references = match explanation.get("references") {
        Some(Value::Array(references)) => references
            .iter()
            .enumerate()
            .map(|(position, reference)| {
                reference.as_str().map(str::to_string).ok_or_else(|| {
                    ResponseValidationError::violation(
                        index,
                        "explanation.references",
                        format!("entry {position} must be a string, found {}", json_type(reference)),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ResponseValidationError::violation(
                index,
                "explanation.references",
                format!("must be an array, found {}", json_type(other)),
            ))
        }
        None => {
            return Err(ResponseValidationError::violation(
                index,
                "explanation.references",
                "is missing",
            ))
        }
    };

    Ok(QuizQuestion {
        question_text,
        options,
        correct_answer_index,
        explanation: Explanation { reason, references },
    })
}

fn required_text(
    index: usize,
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ResponseValidationError> {
    match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(ResponseValidationError::violation(index, field, "is empty")),
        Some(other) => Err(ResponseValidationError::violation(
            index,
            field,
            format!("must be a string, found {}", json_type(other)),
        )),
        None => Err(ResponseValidationError::violation(index, field, "is missing")),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
