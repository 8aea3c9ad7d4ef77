//! Classification of model backend responses.
//!
//! This is the single place where raw completion text becomes a
//! [`ModelResult`]. The refusal sentinel is compared here and nowhere else.

use serde::Deserialize;

use crate::core::types::ModelResult;

/// Safe command the model is instructed to emit when it declines a goal.
///
/// Matched byte-for-byte after trimming; paraphrased refusals are treated as
/// ordinary candidate commands and go through the confirmation gate.
pub const REFUSAL_SENTINEL: &str = r#"echo "Error: Task is too risky or requires manual intervention (e.g., reboot, live environment).""#;

#[derive(Debug, Deserialize)]
struct CompletionBody {
    error: Option<ErrorBody>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Parse a chat-completion response body into a [`ModelResult`].
///
/// An `error` object wins over any choices. Only `choices[0]` is consulted.
/// Bodies that are not JSON, or carry no content, classify as
/// [`ModelResult::Empty`].
pub fn parse_completion(body: &str) -> ModelResult {
    let Ok(parsed) = serde_json::from_str::<CompletionBody>(body) else {
        return ModelResult::Empty;
    };
    if let Some(error) = parsed.error {
        let message = error
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "unknown error".to_string());
        return ModelResult::ApiError(message);
    }
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();
    classify_completion(&content)
}

/// Classify extracted completion text.
///
/// Surrounding whitespace is trimmed once; the remaining text is never
/// otherwise altered.
pub fn classify_completion(text: &str) -> ModelResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        ModelResult::Empty
    } else if trimmed == REFUSAL_SENTINEL {
        ModelResult::Refusal(trimmed.to_string())
    } else {
        ModelResult::Command(trimmed.to_string())
    }
}
