//! Claude integration for schedule generation
//!
//! Sends the fixed output-contract prompt plus the raw workout text to
//! the Claude API and parses the completion into a loose JSON value for
//! the normalizer. Everything here is fallible by design; the pipeline
//! treats any error as "generative path failed" and falls back.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::schedule::UserLevel;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1500;
/// One attempt per request; the deterministic chain is the retry policy
const REQUEST_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = include_str!("prompts/schedule_system.txt");

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest {
  model: String,
  max_tokens: u32,
  system: String,
  messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
  role: String,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
  content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  content_type: String,
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

pub struct ClaudeClient {
  client: Client,
  api_key: String,
  base_url: String,
}

impl ClaudeClient {
  /// Create a client, loading the API key from the environment
  pub fn from_env() -> Result<Self, LlmError> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
    Self::new(api_key, CLAUDE_BASE_URL.to_string())
  }

  /// Create a client against an explicit base URL (tests point this at a
  /// local mock server)
  pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .map_err(|e| LlmError::Request(e.to_string()))?;

    Ok(Self {
      client,
      api_key,
      base_url,
    })
  }

  /// One completion call: system prompt + user message in, raw
  /// completion text out. No retries, no streaming.
  pub async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
    let request = ClaudeRequest {
      model: CLAUDE_MODEL.to_string(),
      max_tokens: MAX_TOKENS,
      system: system_prompt.to_string(),
      messages: vec![ClaudeMessage {
        role: "user".to_string(),
        content: user_message.to_string(),
      }],
    };

    let response = self
      .client
      .post(format!("{}{}", self.base_url, MESSAGES_PATH))
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      if let Ok(error_resp) = serde_json::from_str::<ClaudeErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let claude_response: ClaudeResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    claude_response
      .content
      .into_iter()
      .find(|c| c.content_type == "text")
      .and_then(|c| c.text)
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))
  }

  /// Generate a schedule for the given workout text. The result is a
  /// loose JSON value; shape validation is the normalizer's job, not
  /// ours.
  pub async fn generate_schedule_value(
    &self,
    text: &str,
    level: Option<UserLevel>,
  ) -> Result<Value, LlmError> {
    let user_message = build_user_prompt(text, level);
    let completion = self.complete(SYSTEM_PROMPT, &user_message).await?;
    let json_str = extract_json(&completion)?;
    serde_json::from_str(&json_str).map_err(|e| LlmError::Parse(e.to_string()))
  }
}

fn build_user_prompt(text: &str, level: Option<UserLevel>) -> String {
  match level {
    Some(level) => format!(
      "Athlete level: {}\n\nWorkout description:\n{}",
      level.as_str(),
      text
    ),
    None => format!("Workout description:\n{}", text),
  }
}

/// Extract the JSON payload from a completion that may wrap it in prose
/// or a markdown fence
fn extract_json(text: &str) -> Result<String, LlmError> {
  let trimmed = text.trim();
  if trimmed.starts_with('{') || trimmed.starts_with('[') {
    return Ok(trimmed.to_string());
  }

  if let Some(fence_start) = trimmed.find("```") {
    let after_fence = &trimmed[fence_start + 3..];
    // Skip an optional language tag on the fence line
    let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let content = &after_fence[content_start..];
    if let Some(fence_end) = content.find("```") {
      return Ok(content[..fence_end].trim().to_string());
    }
  }

  if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
    if start < end {
      return Ok(trimmed[start..=end].to_string());
    }
  }

  Err(LlmError::Parse(
    "Could not extract JSON from response".to_string(),
  ))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_extract_json_direct() {
    let input = r#"{"title": "Tabata", "blocks": []}"#;
    assert_eq!(extract_json(input).unwrap(), input);
  }

  #[test]
  fn test_extract_json_from_fenced_block() {
    let input = "Here you go:\n\n```json\n{\"title\": \"Tabata\"}\n```\n\nEnjoy!";
    assert_eq!(extract_json(input).unwrap(), r#"{"title": "Tabata"}"#);
  }

  #[test]
  fn test_extract_json_brace_scan_fallback() {
    let input = r#"The schedule is {"title": "Tabata"} as requested."#;
    assert_eq!(extract_json(input).unwrap(), r#"{"title": "Tabata"}"#);
  }

  #[test]
  fn test_extract_json_rejects_proseless_garbage() {
    assert!(extract_json("no json here at all").is_err());
  }

  #[test]
  fn test_user_prompt_includes_level_only_when_present() {
    let with = build_user_prompt("tabata", Some(UserLevel::Beginner));
    assert!(with.contains("Athlete level: beginner"));

    let without = build_user_prompt("tabata", None);
    assert!(!without.contains("Athlete level"));
    assert!(without.contains("tabata"));
  }

  #[test]
  #[serial]
  fn test_from_env_requires_api_key() {
    temp_env::with_var("ANTHROPIC_API_KEY", None::<&str>, || {
      assert!(matches!(
        ClaudeClient::from_env(),
        Err(LlmError::MissingApiKey)
      ));
    });
  }

  #[tokio::test]
  async fn test_generate_schedule_value_parses_completion() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{
      "content": [{"type": "text", "text": "{\"type\": \"TABATA\", \"rounds\": 8}"}],
      "model": "claude-sonnet-4-20250514",
      "stop_reason": "end_turn"
    }"#;
    let mock = server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(body)
      .create_async()
      .await;

    let client = ClaudeClient::new("test-key".to_string(), server.url()).unwrap();
    let value = client
      .generate_schedule_value("tabata please", None)
      .await
      .unwrap();

    assert_eq!(value["type"], "TABATA");
    assert_eq!(value["rounds"], 8);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_api_error_body_surfaces_message() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(429)
      .with_body(r#"{"error": {"message": "rate limited"}}"#)
      .create_async()
      .await;

    let client = ClaudeClient::new("test-key".to_string(), server.url()).unwrap();
    let err = client.complete("system", "user").await.unwrap_err();
    match err {
      LlmError::Api(msg) => assert_eq!(msg, "rate limited"),
      other => panic!("expected Api error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_non_json_completion_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_body(r#"{"content": [{"type": "text", "text": "sorry, I cannot help"}]}"#)
      .create_async()
      .await;

    let client = ClaudeClient::new("test-key".to_string(), server.url()).unwrap();
    let err = client
      .generate_schedule_value("whatever", None)
      .await
      .unwrap_err();
    assert!(matches!(err, LlmError::Parse(_)));
  }
}
