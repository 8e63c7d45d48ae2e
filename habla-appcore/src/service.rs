use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use habla_core::config::{Configuration, OLLAMA_API_KEY};
use habla_core::conversation::{ConversationLog, ConversationTurn, Role};
use habla_core::types::{BackendOutcome, ConnectionStatus, ModelDescriptor};
use habla_engine::diagnostics;
use habla_engine::router::BackendRouter;
use habla_engine::traits::{CloudChatService, LocalModelService};
use habla_engine::tutor::Tutor;
use habla_runtime::config_store::ConfigStore;
use habla_runtime::models::ModelDiscovery;
use habla_runtime::paths::AppPaths;
use habla_runtime::secrets::SecretsStore;
use habla_runtime::{OllamaCloudService, OllamaLocalService};
use serde::Serialize;

/// Where settings live and what they currently select. Never carries the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigInfo {
    pub config_file: PathBuf,
    pub secrets_file: PathBuf,
    pub logs_dir: PathBuf,
    pub preferred_model: String,
    pub use_cloud: bool,
    pub endpoint: String,
    pub has_api_key: bool,
}

/// Everything a front end needs: settings, credentials, tutoring verbs and the practice log.
///
/// Each verb reads the current configuration and key, so saved changes apply to the next call
/// without rebuilding the service.
#[derive(Clone)]
pub struct TutorService {
    paths: AppPaths,
    config_store: Arc<ConfigStore>,
    secrets: Arc<SecretsStore>,
    router: BackendRouter,
    discovery: ModelDiscovery,
    conversation: Arc<tokio::sync::Mutex<ConversationLog>>,
}

impl std::fmt::Debug for TutorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TutorService")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl TutorService {
    /// Service backed by the Ollama HTTP API.
    pub fn new(paths: AppPaths) -> anyhow::Result<Self> {
        Self::with_services(
            paths,
            Arc::new(OllamaLocalService::new()),
            Arc::new(OllamaCloudService::new()),
        )
    }

    pub fn with_services(
        paths: AppPaths,
        local: Arc<dyn LocalModelService>,
        cloud: Arc<dyn CloudChatService>,
    ) -> anyhow::Result<Self> {
        paths
            .ensure_dirs()
            .with_context(|| format!("failed to prepare {}", paths.app_dir.display()))?;

        let config_store = ConfigStore::at_path(&paths.config_file);
        let secrets = SecretsStore::new(&paths.secrets_file, paths.project_secrets_file.clone());
        let max_turns = config_store.load().max_conversation_history();

        Ok(Self {
            discovery: ModelDiscovery::new(local.clone(), Some(paths.manifests_dir.clone())),
            router: BackendRouter::new(local, cloud),
            config_store: Arc::new(config_store),
            secrets: Arc::new(secrets),
            conversation: Arc::new(tokio::sync::Mutex::new(ConversationLog::new(max_turns))),
            paths,
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    fn tutor(&self) -> Tutor {
        Tutor::new(
            self.router.clone(),
            self.config_store.load(),
            self.secrets.get_secret(OLLAMA_API_KEY),
        )
    }

    pub async fn translate(&self, text: &str) -> BackendOutcome {
        self.tutor().translate_to_spanish_outcome(text).await
    }

    pub async fn correct(&self, text: &str) -> BackendOutcome {
        self.tutor().correct_spanish_outcome(text).await
    }

    /// One practice exchange. The user turn is always recorded; the reply only when it succeeded.
    pub async fn converse(&self, text: &str, is_source_spanish: bool) -> BackendOutcome {
        let tutor = self.tutor();
        let max_turns = tutor.config().max_conversation_history();

        {
            let mut log = self.conversation.lock().await;
            log.set_max_turns(max_turns);
            log.push(Role::User, text, timestamp());
        }

        let out = tutor
            .conversational_response_outcome(text, is_source_spanish)
            .await;

        if out.is_success() {
            let dropped = self
                .conversation
                .lock()
                .await
                .push(Role::Assistant, out.text(), timestamp());
            if dropped > 0 {
                log::debug!("conversation trimmed by {dropped} turns");
            }
        }
        out
    }

    pub async fn conversation(&self) -> Vec<ConversationTurn> {
        self.conversation.lock().await.turns().to_vec()
    }

    pub async fn clear_conversation(&self) {
        self.conversation.lock().await.clear();
        log::info!("conversation cleared");
    }

    pub async fn list_local_models(&self) -> Vec<String> {
        let cfg = self.config_store.load();
        self.discovery.list_local_models(cfg.local_endpoint()).await
    }

    pub fn list_cloud_models(&self) -> Vec<ModelDescriptor> {
        self.discovery.list_cloud_models()
    }

    pub async fn test_connection(&self) -> ConnectionStatus {
        let cfg = self.config_store.load();
        diagnostics::test_connection(self.router.local_service().as_ref(), cfg.local_endpoint())
            .await
    }

    pub fn load_config(&self) -> Configuration {
        self.config_store.load()
    }

    pub fn reload_config(&self) -> Configuration {
        self.config_store.reload()
    }

    pub fn save_config(&self, cfg: &Configuration) -> anyhow::Result<()> {
        if !self.config_store.save(cfg) {
            anyhow::bail!(
                "failed to save configuration to {}",
                self.config_store.path().display()
            );
        }
        Ok(())
    }

    /// Defaults apply immediately; the error reports that they could not be persisted.
    pub fn reset_config(&self) -> anyhow::Result<Configuration> {
        let (cfg, saved) = self.config_store.reset();
        if !saved {
            anyhow::bail!(
                "configuration reset in memory only; could not write {}",
                self.config_store.path().display()
            );
        }
        Ok(cfg)
    }

    pub fn set_api_key(&self, value: &str) -> anyhow::Result<()> {
        if !self.secrets.set_secret(OLLAMA_API_KEY, value) {
            anyhow::bail!(
                "failed to save API key to {}",
                self.secrets.active_path().display()
            );
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.secrets.get_secret(OLLAMA_API_KEY).trim().is_empty()
    }

    pub fn config_info(&self) -> ConfigInfo {
        let cfg = self.config_store.load();
        let endpoint = if cfg.use_cloud() {
            cfg.cloud_endpoint()
        } else {
            cfg.local_endpoint()
        };

        ConfigInfo {
            config_file: self.config_store.path().to_path_buf(),
            secrets_file: self.secrets.active_path().to_path_buf(),
            logs_dir: self.paths.logs_dir.clone(),
            preferred_model: cfg.preferred_model().to_string(),
            use_cloud: cfg.use_cloud(),
            endpoint: endpoint.to_string(),
            has_api_key: self.has_api_key(),
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use habla_core::config::keys;
    use habla_core::types::FailureCategory;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(dir: &tempfile::TempDir) -> TutorService {
        TutorService::new(AppPaths::from_home(dir.path(), None)).unwrap()
    }

    async fn chat_server(reply: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "content": reply }
            })))
            .mount(&server)
            .await;
        server
    }

    fn point_at(svc: &TutorService, server: &MockServer, max_history: i64) {
        let cfg = svc
            .load_config()
            .with(keys::LOCAL_ENDPOINT, server.uri())
            .with(keys::MAX_CONVERSATION_HISTORY, max_history);
        svc.save_config(&cfg).unwrap();
    }

    #[tokio::test]
    async fn first_start_bootstraps_config() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        assert!(svc.paths().config_file.exists());
        assert!(!svc.has_api_key());

        let info = svc.config_info();
        assert!(!info.use_cloud);
        assert_eq!(info.endpoint, "http://localhost:11434");
        assert_eq!(info.preferred_model, "deepseek-v3.1:671b-cloud");
    }

    #[tokio::test]
    async fn translate_uses_saved_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let server = chat_server("Spanish: Buenos días\nNotes: formal").await;
        point_at(&svc, &server, 50);

        let out = svc.translate("Good morning").await;
        assert!(out.is_success());
        assert!(out.text().starts_with("Spanish: Buenos días"));
    }

    #[tokio::test]
    async fn conversation_is_recorded_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let server = chat_server("¡Qué bien!").await;
        point_at(&svc, &server, 3);

        svc.converse("Hola", true).await;
        svc.converse("Me llamo Ana", true).await;

        let turns = svc.conversation().await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(turns[1].content, "Me llamo Ana");
        assert_eq!(turns[2].content, "¡Qué bien!");

        svc.clear_conversation().await;
        assert!(svc.conversation().await.is_empty());
    }

    #[tokio::test]
    async fn failed_reply_keeps_only_user_turn() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        svc.save_config(&svc.load_config().with(keys::USE_CLOUD, true))
            .unwrap();

        let out = svc.converse("Hello", false).await;
        assert_eq!(out.category(), Some(FailureCategory::MissingCredential));
        let turns = svc.conversation().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
    }

    #[tokio::test]
    async fn api_key_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        svc.set_api_key("sk-live").unwrap();
        assert!(svc.has_api_key());
        assert!(svc.config_info().has_api_key);

        let text = std::fs::read_to_string(&svc.paths().secrets_file).unwrap();
        assert!(text.contains("OLLAMA_API_KEY=sk-live"));
        assert!(!format!("{:?}", svc.config_info()).contains("sk-live"));
    }

    #[tokio::test]
    async fn connection_test_and_discovery_share_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "mistral:7b" }, { "model": "llama3:latest" }]
            })))
            .mount(&server)
            .await;
        point_at(&svc, &server, 50);

        let status = svc.test_connection().await;
        assert!(status.connected);
        assert_eq!(status.models_found, 2);
        assert_eq!(
            svc.list_local_models().await,
            vec!["llama3:latest", "mistral:7b"]
        );
        assert_eq!(svc.list_cloud_models().len(), 4);
    }

    #[tokio::test]
    async fn reset_discards_saved_changes() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        svc.save_config(&svc.load_config().with(keys::THEME, "dark"))
            .unwrap();
        assert_eq!(svc.reload_config().get_str(keys::THEME), Some("dark"));

        svc.reset_config().unwrap();
        assert_eq!(svc.reload_config().get_str(keys::THEME), Some("light"));
    }
}
