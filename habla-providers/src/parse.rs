use anyhow::{Context, anyhow};
use habla_core::types::LocalModel;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub fn parse_chat_response(body: &[u8]) -> anyhow::Result<String> {
    let resp: ChatResponse = serde_json::from_slice(body).context("decode chat JSON")?;
    if let Some(err) = resp.error {
        return Err(anyhow!("model service error: {err}"));
    }
    resp.message
        .and_then(|m| m.content)
        .ok_or_else(|| anyhow!("no message content in chat response"))
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: Option<String>,
    model: Option<String>,
}

/// Older service versions label entries `name`, newer ones also send `model`; prefer `name`.
pub fn parse_model_list(body: &[u8]) -> anyhow::Result<Vec<LocalModel>> {
    let resp: TagsResponse = serde_json::from_slice(body).context("decode model list JSON")?;
    Ok(resp
        .models
        .into_iter()
        .filter_map(|e| e.name.filter(|n| !n.trim().is_empty()).or(e.model))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .map(LocalModel::new)
        .collect())
}

/// Pull the `error` field out of a non-2xx body, falling back to the raw text.
pub fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(e) => e.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
