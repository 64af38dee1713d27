pub mod openai;
pub mod prompt;
pub mod schema;
pub mod validator;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use openai::OpenAiGenerationService;
pub use prompt::{PromptBuilder, PromptError};
pub use validator::{ResponseValidationError, ResponseValidator};

/// A prompt plus the structural schema the service must constrain its output to.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub schema_name: String,
    pub schema: Value,
}

#[derive(Debug, Error)]
pub enum GenerationServiceError {
    #[error("generation API error: {0}")]
    Api(String),

    #[error("generation refused: {0}")]
    Refused(String),

    #[error("generation output truncated (finish_reason={0})")]
    Truncated(String),

    #[error("generation response had no content")]
    EmptyResponse,

    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

/// The generative-text backend. Returns the raw completion text, which is
/// untrusted until it passes [`ResponseValidator`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationServiceError>;
}
