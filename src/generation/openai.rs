use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use super::{GenerationRequest, GenerationService, GenerationServiceError};

/// Chat-completions backend using strict `json_schema` structured output.
pub struct OpenAiGenerationService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationService {
    pub fn new(api_key: &SecretString, api_base: &str, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema
                }
            }
        })
    }
}

#[async_trait]
impl GenerationService for OpenAiGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationServiceError> {
        log::debug!(
            "Sending generation request to model {} ({} prompt chars)",
            self.model,
            request.prompt.len()
        );

        let response: Value = self
            .client
            .chat()
            .create_byot(self.request_body(request))
            .await
            .map_err(|e| {
                log::warn!("Chat completion call failed: {}", e);
                GenerationServiceError::Api(e.to_string())
            })?;

        completion_text(&response)
    }
}

/// Pulls the assistant text out of a chat completion, rejecting refusals and
/// output cut off before the JSON document closed.
fn completion_text(response: &Value) -> Result<String, GenerationServiceError> {
    let choice = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or(GenerationServiceError::EmptyResponse)?;

    let message = &choice["message"];

    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Err(GenerationServiceError::Refused(refusal.to_string()));
    }

    if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
        if reason == "length" || reason == "content_filter" {
            return Err(GenerationServiceError::Truncated(reason.to_string()));
        }
    }

    match message.get("content").and_then(Value::as_str) {
        Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
        _ => Err(GenerationServiceError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::schema::{quiz_response_schema, SCHEMA_NAME};

    fn completion(message: Value, finish_reason: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }]
        })
    }

    #[test]
    fn request_body_uses_strict_json_schema() {
        let service = OpenAiGenerationService::new(
            &SecretString::from("sk-test"),
            "http://localhost:1/v1",
            "gpt-test",
        );
        let request = GenerationRequest {
            system_instruction: "system".to_string(),
            prompt: "prompt".to_string(),
            schema_name: SCHEMA_NAME.to_string(),
            schema: quiz_response_schema(),
        };

        let body = service.request_body(&request);

        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "prompt");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["name"], SCHEMA_NAME);
        assert_eq!(body["response_format"]["json_schema"]["schema"], quiz_response_schema());
    }

    #[test]
    fn returns_message_content() {
        let response = completion(
            json!({ "role": "assistant", "content": "{\"questions\":[]}", "refusal": null }),
            "stop",
        );

        assert_eq!(completion_text(&response).expect("content"), "{\"questions\":[]}");
    }

    #[test]
    fn refusal_is_an_error() {
        let response = completion(
            json!({ "role": "assistant", "content": null, "refusal": "I can't help with that" }),
            "stop",
        );

        assert!(matches!(
            completion_text(&response),
            Err(GenerationServiceError::Refused(_))
        ));
    }

    #[test]
    fn length_cutoff_is_an_error() {
        let response = completion(json!({ "role": "assistant", "content": "{\"questions\":[" }), "length");

        assert!(matches!(
            completion_text(&response),
            Err(GenerationServiceError::Truncated(_))
        ));
    }

    #[test]
    fn missing_choices_or_content_is_empty() {
        assert!(matches!(
            completion_text(&json!({ "choices": [] })),
            Err(GenerationServiceError::EmptyResponse)
        ));

        let response = completion(json!({ "role": "assistant", "content": "  " }), "stop");
        assert!(matches!(
            completion_text(&response),
            Err(GenerationServiceError::EmptyResponse)
        ));
    }
}
