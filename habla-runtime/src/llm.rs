use async_trait::async_trait;
use habla_core::types::LocalModel;
use habla_engine::traits::{BackendError, CloudChatService, LocalModelService};
use habla_providers::ollama::{ChatMessage, build_chat_request, build_list_models_request};
use habla_providers::parse::{error_message, parse_chat_response, parse_model_list};
use habla_providers::request::HttpRequest;
use habla_providers::runtime::{HttpResponse, Timeouts, TransportError, execute};

/// The model-serving process on this machine. Requests are unauthenticated and never time out;
/// a large model can take minutes on first load.
#[derive(Debug, Clone, Default)]
pub struct OllamaLocalService;

impl OllamaLocalService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalModelService for OllamaLocalService {
    async fn list_models(&self, endpoint: &str) -> Result<Vec<LocalModel>, BackendError> {
        let req = build_list_models_request(endpoint);
        let resp = send(&req, Timeouts::LOCAL).await?;
        parse_model_list(&resp.body).map_err(|e| BackendError::Protocol(format!("{e:#}")))
    }

    async fn chat(
        &self,
        endpoint: &str,
        model: &str,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, BackendError> {
        let messages = [ChatMessage::system(system_message), ChatMessage::user(user_message)];
        let req = build_chat_request(endpoint, None, model, &messages);
        let resp = send(&req, Timeouts::LOCAL).await?;
        parse_chat_response(&resp.body).map_err(|e| BackendError::Protocol(format!("{e:#}")))
    }
}

/// The hosted chat API, authenticated with a bearer token.
#[derive(Clone, Default)]
pub struct OllamaCloudService {
    timeouts: Option<Timeouts>,
}

impl std::fmt::Debug for OllamaCloudService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaCloudService")
            .field("timeouts", &self.timeouts())
            .finish()
    }
}

impl OllamaCloudService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts.unwrap_or(Timeouts::CLOUD)
    }
}

#[async_trait]
impl CloudChatService for OllamaCloudService {
    async fn chat(
        &self,
        endpoint: &str,
        api_key: &str,
        model: &str,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, BackendError> {
        let messages = [ChatMessage::system(system_message), ChatMessage::user(user_message)];
        let req = build_chat_request(endpoint, Some(api_key), model, &messages);
        let resp = send(&req, self.timeouts()).await?;
        parse_chat_response(&resp.body).map_err(|e| BackendError::Protocol(format!("{e:#}")))
    }
}

async fn send(req: &HttpRequest, timeouts: Timeouts) -> Result<HttpResponse, BackendError> {
    log::debug!("{} {}", req.method, req.url);
    let resp = execute(req, timeouts).await.map_err(map_transport)?;
    if resp.is_success() {
        Ok(resp)
    } else {
        Err(map_status(&resp))
    }
}

fn map_transport(e: TransportError) -> BackendError {
    match e {
        TransportError::Connect(msg) => BackendError::Unreachable(msg),
        TransportError::Timeout(msg) => BackendError::Unreachable(format!("timed out: {msg}")),
        other => BackendError::Protocol(other.to_string()),
    }
}

fn map_status(resp: &HttpResponse) -> BackendError {
    let detail = error_message(&resp.body);
    match resp.status {
        401 | 403 => BackendError::Unauthorized {
            status: resp.status,
            detail,
        },
        404 => BackendError::NotFound(detail),
        status => BackendError::Status { status, detail },
    }
}
