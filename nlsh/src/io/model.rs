//! Model client for an OpenAI-style chat-completions backend.
//!
//! The [`ModelBackend`] trait covers the single HTTP round trip so the turn
//! pipeline can be driven by scripted responses in tests. Request building and
//! response classification live here too; they do not depend on the transport.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::classifier::parse_completion;
use crate::core::types::ModelResult;
use crate::io::session_log::RecordKind;
use crate::session::Session;

/// Characters of the raw response kept in debug log records.
pub const RESPONSE_PREVIEW_CHARS: usize = 500;

const REDACTED: &str = "<redacted>";

/// Fixed sampling parameters for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub n: u32,
    /// Always serialized as `null`.
    pub stop: Option<Vec<String>>,
}

impl ChatRequest {
    pub fn new(settings: &ModelSettings, system_instruction: &str, goal: &str) -> Self {
        Self {
            model: settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: goal.to_string(),
                },
            ],
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            n: 1,
            stop: None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("serialize chat request")
    }

    /// Compact JSON of the request with user content replaced by a placeholder.
    pub fn redacted_summary(&self) -> Result<String> {
        let mut redacted = self.clone();
        for message in redacted.messages.iter_mut().filter(|m| m.role == "user") {
            message.content = REDACTED.to_string();
        }
        serde_json::to_string(&redacted).context("serialize redacted request")
    }
}

/// Raw HTTP response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the chat-completions transport.
pub trait ModelBackend {
    /// Perform exactly one round trip with an already-encoded JSON payload.
    fn send(&self, payload: &[u8]) -> Result<RawResponse>;
}

/// Blocking HTTP backend with bearer-token auth.
pub struct HttpBackend {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(endpoint: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key,
            client,
        })
    }
}

impl ModelBackend for HttpBackend {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, bytes = payload.len()))]
    fn send(&self, payload: &[u8]) -> Result<RawResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;
        let status = response.status().as_u16();
        let body = response.text().context("read response body")?;
        debug!(status, body_len = body.len(), "backend responded");
        Ok(RawResponse { status, body })
    }
}

/// Classify a raw response, folding HTTP failures into [`ModelResult::ApiError`].
pub fn interpret_response(response: &RawResponse) -> ModelResult {
    let result = parse_completion(&response.body);
    if response.is_success() {
        return result;
    }
    match result {
        ModelResult::ApiError(message) => ModelResult::ApiError(message),
        _ => ModelResult::ApiError(format!("HTTP {}", response.status)),
    }
}

/// First `max_chars` characters of `text`, marked when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... [{} bytes total]", &text[..cut], text.len()),
        None => text.to_string(),
    }
}

/// Send one request and classify the answer.
///
/// Every call logs an api record; the redacted payload and a response preview
/// are logged only in debug mode. Transport failures are returned as errors.
pub fn query<B: ModelBackend>(
    backend: &B,
    session: &mut Session,
    request: &ChatRequest,
) -> Result<ModelResult> {
    let payload = request.encode()?;
    if session.flags().debug {
        let summary = request.redacted_summary()?;
        session.record(RecordKind::ApiCall, &format!("payload: {summary}"));
    }
    session.record(
        RecordKind::ApiCall,
        &format!("sending request (model {})", request.model),
    );

    let response = backend.send(&payload)?;
    session.record(
        RecordKind::ApiCall,
        &format!(
            "response received (HTTP {}, {} bytes)",
            response.status,
            response.body.len()
        ),
    );
    if session.flags().debug {
        session.record(
            RecordKind::ApiCall,
            &format!("response: {}", preview(&response.body, RESPONSE_PREVIEW_CHARS)),
        );
    }
    if !response.is_success() {
        warn!(status = response.status, "backend returned non-success status");
    }
    Ok(interpret_response(&response))
}
