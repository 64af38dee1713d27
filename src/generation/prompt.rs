use serde_json::Value;
use thiserror::Error;

use crate::{
    generation::{
        schema::{quiz_response_schema, SCHEMA_NAME},
        GenerationRequest,
    },
    models::domain::{quiz_question::OPTIONS_PER_QUESTION, QuizConfig},
};

pub const SYSTEM_INSTRUCTION: &str = "You are an assessment author. You write multiple-choice quiz questions \
strictly from the source content supplied by the user. Never use outside knowledge, never invent facts, \
and answer only with JSON matching the provided schema.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("source document contains no extractable text")]
    EmptySource,

    #[error("source document has {chars} characters, limit is {limit}")]
    SourceTooLarge { chars: usize, limit: usize },
}

/// Builds schema-constrained generation requests. Source text is embedded in
/// full; oversized text is rejected rather than truncated, since truncation
/// would break explanation references.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_source_chars: usize,
    schema: Value,
}

impl PromptBuilder {
    pub fn new(max_source_chars: usize) -> Self {
        Self {
            max_source_chars,
            schema: quiz_response_schema(),
        }
    }

    pub fn max_source_chars(&self) -> usize {
        self.max_source_chars
    }

    pub fn build_request(&self, text: &str, config: &QuizConfig) -> Result<GenerationRequest, PromptError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(PromptError::EmptySource);
        }

        let chars = content.chars().count();
        if chars > self.max_source_chars {
            return Err(PromptError::SourceTooLarge {
                chars,
                limit: self.max_source_chars,
            });
        }

        Ok(GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: quiz_prompt(content, config),
            schema_name: SCHEMA_NAME.to_string(),
            schema: self.schema.clone(),
        })
    }
}

fn quiz_prompt(content: &str, config: &QuizConfig) -> String {
    let count = config.number_of_questions;
    format!(
        "Generate a multiple-choice quiz based on the following content.

Requirements:
- Difficulty level: {difficulty}
- Generate exactly {count} questions, no more and no fewer
- Each question must have exactly {options} options
- Exactly one option must be correct; the other {wrong} must be incorrect but plausible
- Set correctAnswerIndex to the zero-based position of the correct option (0 to {max_index})
- Give every question an explanation whose reason says why the correct option is right
- In explanation.references, quote the specific passages of the content that support the answer; \
use an empty list only if no passage applies
- Return the questions in a JSON object under the key \"questions\"

Content to generate questions from:
<content>
{content}
</content>",
        difficulty = config.difficulty,
        options = OPTIONS_PER_QUESTION,
        wrong = OPTIONS_PER_QUESTION - 1,
        max_index = OPTIONS_PER_QUESTION - 1,
    )
}
