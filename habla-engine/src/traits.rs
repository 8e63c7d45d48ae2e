use async_trait::async_trait;
use habla_core::config::SpeechSettings;
use habla_core::types::LocalModel;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a model backend.
///
/// Services map what their transport knows into these variants so the router does not have to
/// guess from message text. `Protocol` is the catch-all for anything unstructured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("service unreachable: {0}")]
    Unreachable(String),
    #[error("unauthorized (status {status}): {detail}")]
    Unauthorized { status: u16, detail: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    Protocol(String),
}

/// The locally running model-serving process.
#[async_trait]
pub trait LocalModelService: Send + Sync {
    async fn list_models(&self, endpoint: &str) -> Result<Vec<LocalModel>, BackendError>;

    async fn chat(
        &self,
        endpoint: &str,
        model: &str,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, BackendError>;
}

/// A hosted chat API reached over authenticated HTTPS.
#[async_trait]
pub trait CloudChatService: Send + Sync {
    async fn chat(
        &self,
        endpoint: &str,
        api_key: &str,
        model: &str,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("no speech detected before the timeout")]
    Timeout,
    #[error("speech was unintelligible")]
    Unintelligible,
    #[error("speech service error: {0}")]
    Service(String),
}

/// Text-to-speech collaborator. Produces a temporary audio file the caller owns.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str, slow: bool)
    -> Result<PathBuf, SpeechError>;
}

/// Speech-to-text collaborator listening on the default microphone.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn listen(&self, settings: &SpeechSettings) -> Result<String, SpeechError>;
}
