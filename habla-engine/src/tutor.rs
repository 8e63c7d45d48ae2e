use crate::router::BackendRouter;
use habla_core::config::Configuration;
use habla_core::prompts::{PromptPair, converse_prompt, correct_prompt, translate_prompt};
use habla_core::types::BackendOutcome;

/// Translation, correction and conversation practice over the backend router.
///
/// Holds its own copy of the configuration and credential; call [`Tutor::update_config`] after
/// the user saves new settings.
#[derive(Clone)]
pub struct Tutor {
    router: BackendRouter,
    config: Configuration,
    api_key: String,
}

impl std::fmt::Debug for Tutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tutor")
            .field("model", &self.config.preferred_model())
            .field("use_cloud", &self.config.use_cloud())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Tutor {
    pub fn new(router: BackendRouter, config: Configuration, api_key: impl Into<String>) -> Self {
        log::info!(
            "tutor initialized: model={} ({})",
            config.preferred_model(),
            if config.use_cloud() { "cloud" } else { "local" }
        );
        Self {
            router,
            config,
            api_key: api_key.into(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn update_config(&mut self, config: Configuration, api_key: impl Into<String>) {
        self.config = config;
        self.api_key = api_key.into();
        log::info!("tutor configuration updated: model={}", self.config.preferred_model());
    }

    pub async fn translate_to_spanish(&self, text: &str) -> String {
        self.translate_to_spanish_outcome(text).await.into_text()
    }

    pub async fn correct_spanish(&self, text: &str) -> String {
        self.correct_spanish_outcome(text).await.into_text()
    }

    pub async fn conversational_response(&self, text: &str, is_source_spanish: bool) -> String {
        self.conversational_response_outcome(text, is_source_spanish)
            .await
            .into_text()
    }

    pub async fn translate_to_spanish_outcome(&self, text: &str) -> BackendOutcome {
        log::info!("translation request: '{}'", preview(text));
        self.run(translate_prompt(text)).await
    }

    pub async fn correct_spanish_outcome(&self, text: &str) -> BackendOutcome {
        log::info!("correction request: '{}'", preview(text));
        self.run(correct_prompt(text)).await
    }

    pub async fn conversational_response_outcome(
        &self,
        text: &str,
        is_source_spanish: bool,
    ) -> BackendOutcome {
        log::info!(
            "conversation request: '{}' (spanish input: {is_source_spanish})",
            preview(text)
        );
        self.run(converse_prompt(text, is_source_spanish)).await
    }

    async fn run(&self, prompt: PromptPair) -> BackendOutcome {
        let out = self
            .router
            .call(&prompt.user, prompt.system, &self.config, &self.api_key)
            .await;
        log::debug!(
            "tutor reply: success={} len={}",
            out.is_success(),
            out.text().len()
        );
        out
    }
}

/// First 50 characters, for logs.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        out.push_str("...");
    }
    out
}
