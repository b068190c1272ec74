//! Chat-completion client for the external AI service.
//!
//! Both the document parser and the insight generator talk to the same
//! OpenAI-compatible endpoint; a missing credential is a first-class state
//! handled by the callers (the client is simply not constructed), not an
//! error raised here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI service unreachable at {0}")]
    Connection(String),

    #[error("AI request timed out after {0}s")]
    Timeout(u64),

    #[error("AI service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

/// Chat-completion client abstraction (allows mocking)
pub trait ChatClient: Send + Sync {
    /// Send one system + user exchange and return the assistant's raw text.
    fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, AiError>;
}

/// Blocking HTTP client for an OpenAI-compatible chat-completions API.
pub struct OpenAiChatClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiChatClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatClient for OpenAiChatClient {
    fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AiError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AiError::Timeout(self.timeout_secs)
                } else {
                    AiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "{}".to_string()))
    }
}

/// Locate the JSON body of a model response. Models sometimes wrap the
/// object in a markdown fence; accept both fenced and bare output.
pub fn extract_json_block(response: &str) -> &str {
    let trimmed = response.trim();
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body = &trimmed[start + fence.len()..];
            if let Some(end) = body.find("```") {
                return body[..end].trim();
            }
        }
    }
    trimmed
}

/// Mock chat client for testing — returns a configured response or fails.
pub struct MockChatClient {
    response: Option<String>,
}

impl MockChatClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
        }
    }

    /// A client whose every call fails, for exercising fallback paths.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

impl ChatClient for MockChatClient {
    fn complete(&self, _system: &str, _user: &str, _temperature: f32) -> Result<String, AiError> {
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => Err(AiError::Connection("mock".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockChatClient::new("{\"ok\": true}");
        let result = client.complete("system", "user", 0.0).unwrap();
        assert_eq!(result, "{\"ok\": true}");
    }

    #[test]
    fn failing_mock_returns_connection_error() {
        let client = MockChatClient::failing();
        assert!(matches!(
            client.complete("s", "u", 0.0),
            Err(AiError::Connection(_))
        ));
    }

    #[test]
    fn openai_client_trims_trailing_slash() {
        let client = OpenAiChatClient::new("https://api.openai.com/v1/", "key", "gpt-4o-mini", 60);
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.timeout_secs, 60);
    }
}
