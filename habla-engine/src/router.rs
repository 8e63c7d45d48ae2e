use crate::traits::{BackendError, CloudChatService, LocalModelService};
use habla_core::catalog::cloud_model_names;
use habla_core::config::Configuration;
use habla_core::types::{BackendOutcome, FailureCategory};
use std::sync::Arc;

/// Which backend a call goes to. Decided by `use_cloud` alone; no memory of earlier calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Cloud,
}

impl Backend {
    pub fn select(cfg: &Configuration) -> Self {
        if cfg.use_cloud() {
            Backend::Cloud
        } else {
            Backend::Local
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Cloud => "cloud",
        }
    }
}

/// Dispatches a system + user prompt pair to the local or cloud backend and turns every
/// failure into a categorized, user-readable outcome. Never retries.
#[derive(Clone)]
pub struct BackendRouter {
    local: Arc<dyn LocalModelService>,
    cloud: Arc<dyn CloudChatService>,
}

impl std::fmt::Debug for BackendRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRouter").finish_non_exhaustive()
    }
}

impl BackendRouter {
    pub fn new(local: Arc<dyn LocalModelService>, cloud: Arc<dyn CloudChatService>) -> Self {
        Self { local, cloud }
    }

    pub fn local_service(&self) -> &Arc<dyn LocalModelService> {
        &self.local
    }

    pub async fn call(
        &self,
        prompt: &str,
        system_prompt: &str,
        cfg: &Configuration,
        api_key: &str,
    ) -> BackendOutcome {
        let backend = Backend::select(cfg);
        let model = cfg.preferred_model();
        log::info!("routing LLM call: {} - {model}", backend.label());

        match backend {
            Backend::Local => {
                self.call_local(prompt, system_prompt, cfg.local_endpoint(), model)
                    .await
            }
            Backend::Cloud => {
                self.call_cloud(prompt, system_prompt, cfg.cloud_endpoint(), model, api_key)
                    .await
            }
        }
    }

    async fn call_local(
        &self,
        prompt: &str,
        system_prompt: &str,
        endpoint: &str,
        model: &str,
    ) -> BackendOutcome {
        log::debug!("local call: model={model} prompt_len={}", prompt.len());
        match self.local.chat(endpoint, model, system_prompt, prompt).await {
            Ok(text) => {
                log::info!("local model response received ({} chars)", text.len());
                BackendOutcome::Success(text)
            }
            Err(e) => classify_local_failure(&e, model),
        }
    }

    async fn call_cloud(
        &self,
        prompt: &str,
        system_prompt: &str,
        endpoint: &str,
        model: &str,
        api_key: &str,
    ) -> BackendOutcome {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            log::error!("no API key provided for cloud call");
            return BackendOutcome::failure(
                FailureCategory::MissingCredential,
                missing_key_message(),
            );
        }

        log::debug!("cloud call: model={model} endpoint={endpoint} prompt_len={}", prompt.len());
        match self
            .cloud
            .chat(endpoint, api_key, model, system_prompt, prompt)
            .await
        {
            Ok(text) => {
                log::info!("cloud model response received ({} chars)", text.len());
                BackendOutcome::Success(text)
            }
            Err(e) => classify_cloud_failure(&e, model, endpoint),
        }
    }
}

fn local_category(e: &BackendError) -> FailureCategory {
    match e {
        BackendError::Unreachable(_) => FailureCategory::ServiceUnavailable,
        BackendError::Protocol(detail) => {
            // Last resort: the transport gave us nothing structured.
            let lower = detail.to_lowercase();
            if lower.contains("connection") || lower.contains("refused") {
                FailureCategory::ServiceUnavailable
            } else {
                FailureCategory::Unknown
            }
        }
        _ => FailureCategory::Unknown,
    }
}

fn cloud_category(e: &BackendError) -> FailureCategory {
    match e {
        BackendError::Unreachable(_) => FailureCategory::ServiceUnavailable,
        BackendError::Unauthorized { .. } => FailureCategory::InvalidCredential,
        BackendError::NotFound(_) => FailureCategory::UnknownModel,
        BackendError::Status { status: 401 | 403, .. } => FailureCategory::InvalidCredential,
        BackendError::Status { status: 404, .. } => FailureCategory::UnknownModel,
        BackendError::Status { .. } => FailureCategory::Unknown,
        BackendError::Protocol(detail) => {
            let lower = detail.to_lowercase();
            if lower.contains("401") || lower.contains("unauthorized") {
                FailureCategory::InvalidCredential
            } else if lower.contains("404") || lower.contains("not found") {
                FailureCategory::UnknownModel
            } else if lower.contains("connection") || lower.contains("resolve") {
                FailureCategory::ServiceUnavailable
            } else {
                FailureCategory::Unknown
            }
        }
    }
}

pub fn classify_local_failure(e: &BackendError, model: &str) -> BackendOutcome {
    let category = local_category(e);
    let message = match category {
        FailureCategory::ServiceUnavailable => {
            log::error!("local connection error: {e}");
            format!(
                "Error: Cannot connect to Ollama service.\n\n\
                 Please ensure Ollama is running:\n\
                 - Windows: Check system tray for Ollama icon\n\
                 - If not running: Start Ollama from the Start Menu or Applications\n\
                 - Or run in a terminal: ollama serve\n\n\
                 Details: {e}"
            )
        }
        _ => {
            log::error!("local LLM error (model={model}): {e:?}");
            format!(
                "Error calling local LLM: {e}\n\n\
                 Troubleshooting:\n\
                 1. Ensure Ollama is running\n\
                 2. Verify the model exists: ollama list\n\
                 3. Try: ollama run {model}"
            )
        }
    };
    BackendOutcome::failure(category, message)
}

pub fn classify_cloud_failure(e: &BackendError, model: &str, endpoint: &str) -> BackendOutcome {
    let category = cloud_category(e);
    let message = match category {
        FailureCategory::InvalidCredential => {
            log::error!("cloud authentication error: {e}");
            format!(
                "Error: Invalid API key.\n\n\
                 Please:\n\
                 1. Check your API key at https://ollama.com/settings/keys\n\
                 2. Update it in Options → API Key Configuration\n\n\
                 Details: {e}"
            )
        }
        FailureCategory::UnknownModel => {
            log::error!("cloud model not found: {e}");
            let known: Vec<String> = cloud_model_names().map(|n| format!("- {n}")).collect();
            format!(
                "Error: Model '{model}' not found on Ollama cloud.\n\n\
                 Available cloud models:\n{}\n\n\
                 Details: {e}",
                known.join("\n")
            )
        }
        FailureCategory::ServiceUnavailable => {
            log::error!("cloud connection error: {e}");
            format!(
                "Error: Cannot connect to {endpoint}\n\n\
                 Please check:\n\
                 1. Internet connection\n\
                 2. Endpoint URL (should be: https://ollama.com)\n\
                 3. Firewall settings\n\n\
                 Details: {e}"
            )
        }
        _ => {
            log::error!("unexpected cloud error (model={model}): {e:?}");
            format!(
                "Error calling Ollama cloud:\n{e}\n\n\
                 If this persists, try:\n\
                 1. Regenerate API key\n\
                 2. Check https://ollama.com/status"
            )
        }
    };
    BackendOutcome::failure(category, message)
}

pub fn missing_key_message() -> &'static str {
    "Error: No API key found.\n\n\
     Please:\n\
     1. Go to https://ollama.com/settings/keys\n\
     2. Create an API key\n\
     3. Save it in Options → API Key Configuration"
}
