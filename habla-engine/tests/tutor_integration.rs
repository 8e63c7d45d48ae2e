use std::sync::{Arc, Mutex};

use habla_core::config::{Configuration, keys};
use habla_core::reply::{CorrectionReply, TranslationReply};
use habla_core::types::{FailureCategory, LocalModel};
use habla_engine::diagnostics::test_connection;
use habla_engine::router::BackendRouter;
use habla_engine::traits::{BackendError, CloudChatService, LocalModelService};
use habla_engine::tutor::Tutor;

struct TestLocal {
    models: Vec<&'static str>,
    down: bool,
    chats: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl LocalModelService for TestLocal {
    async fn list_models(&self, _endpoint: &str) -> Result<Vec<LocalModel>, BackendError> {
        if self.down {
            return Err(BackendError::Unreachable("connection refused".into()));
        }
        Ok(self.models.iter().copied().map(LocalModel::new).collect())
    }

    async fn chat(
        &self,
        endpoint: &str,
        model: &str,
        _system_message: &str,
        user_message: &str,
    ) -> Result<String, BackendError> {
        if self.down {
            return Err(BackendError::Unreachable(format!("{endpoint}: connection refused")));
        }
        self.chats.lock().unwrap().push(format!("{model}|{user_message}"));
        if user_message.starts_with("Review") {
            Ok("Corrected: Correcto\nExplanation: Todo bien.\nEnglish: I am hungry".into())
        } else {
            Ok("**Spanish:** Tengo hambre\n**Notes:** 'tener hambre' is idiomatic".into())
        }
    }
}

struct TestCloud {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    reply: Result<String, BackendError>,
}

#[async_trait::async_trait]
impl CloudChatService for TestCloud {
    async fn chat(
        &self,
        endpoint: &str,
        api_key: &str,
        model: &str,
        _system_message: &str,
        _user_message: &str,
    ) -> Result<String, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), format!("{api_key}|{model}")));
        self.reply.clone()
    }
}

fn setup(
    down: bool,
    cloud_reply: Result<String, BackendError>,
) -> (BackendRouter, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<(String, String)>>>) {
    let chats = Arc::new(Mutex::new(vec![]));
    let calls = Arc::new(Mutex::new(vec![]));
    let router = BackendRouter::new(
        Arc::new(TestLocal {
            models: vec!["llama3:latest", "mistral:7b", "qwen2:7b"],
            down,
            chats: chats.clone(),
        }),
        Arc::new(TestCloud {
            calls: calls.clone(),
            reply: cloud_reply,
        }),
    );
    (router, chats, calls)
}

fn cfg(use_cloud: bool) -> Configuration {
    Configuration::new()
        .with(keys::USE_CLOUD, use_cloud)
        .with(keys::PREFERRED_MODEL, "llama3:latest")
        .with(keys::LOCAL_ENDPOINT, "http://localhost:11434")
        .with(keys::CLOUD_ENDPOINT, "https://ollama.com")
}

#[tokio::test]
async fn local_translation_and_correction_parse() {
    let (router, chats, calls) = setup(false, Ok(String::new()));
    let tutor = Tutor::new(router, cfg(false), "");

    let t = TranslationReply::parse(&tutor.translate_to_spanish("I am hungry").await);
    assert_eq!(t.spanish.as_deref(), Some("Tengo hambre"));
    assert!(t.notes.is_some());

    let c = CorrectionReply::parse(&tutor.correct_spanish("Tengo hambre").await);
    assert!(c.is_confirmed_correct());
    assert_eq!(c.english.as_deref(), Some("I am hungry"));

    let chats = chats.lock().unwrap();
    assert_eq!(chats.len(), 2);
    assert!(chats[0].starts_with("llama3:latest|Translate to Spanish: "));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn switching_backend_takes_effect_on_next_call() {
    let (router, chats, calls) = setup(false, Ok("Hola desde la nube".into()));
    let mut tutor = Tutor::new(router, cfg(false), "");
    tutor.translate_to_spanish("Hello").await;

    tutor.update_config(
        cfg(true).with(keys::PREFERRED_MODEL, "gpt-oss:20b-cloud"),
        "sk-123",
    );
    assert_eq!(tutor.translate_to_spanish("Hello").await, "Hola desde la nube");

    assert_eq!(chats.lock().unwrap().len(), 1);
    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[0],
        ("https://ollama.com".to_string(), "sk-123|gpt-oss:20b-cloud".to_string())
    );
}

#[tokio::test]
async fn local_outage_is_reported_not_raised() {
    let (router, _, _) = setup(true, Ok(String::new()));
    let tutor = Tutor::new(router.clone(), cfg(false), "");

    let out = tutor.conversational_response_outcome("Hola", true).await;
    assert_eq!(out.category(), Some(FailureCategory::ServiceUnavailable));
    assert!(out.text().starts_with("Error: Cannot connect to Ollama"));

    let status = test_connection(router.local_service().as_ref(), "http://localhost:11434").await;
    assert!(!status.connected);
    assert!(status.error.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn cloud_status_errors_are_categorized() {
    let (router, _, _) = setup(
        false,
        Err(BackendError::Status {
            status: 503,
            detail: "overloaded".into(),
        }),
    );
    let tutor = Tutor::new(router, cfg(true), "sk-123");
    let out = tutor.translate_to_spanish_outcome("Hello").await;
    assert_eq!(out.category(), Some(FailureCategory::Unknown));
    assert!(out.text().contains("overloaded"));
}

#[tokio::test]
async fn diagnostics_lists_models_in_service_order() {
    let (router, _, _) = setup(false, Ok(String::new()));
    let status = test_connection(router.local_service().as_ref(), "http://localhost:11434").await;
    assert!(status.connected);
    assert_eq!(status.models_found, 3);
    assert_eq!(status.models[0], "llama3:latest");
}
