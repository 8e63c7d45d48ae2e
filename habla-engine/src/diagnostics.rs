use crate::traits::LocalModelService;
use habla_core::types::ConnectionStatus;

/// Probe the local model service with a single catalog request. No retry, no filesystem fallback.
pub async fn test_connection(local: &dyn LocalModelService, endpoint: &str) -> ConnectionStatus {
    log::info!("testing model service connection at {endpoint}");
    match local.list_models(endpoint).await {
        Ok(models) => {
            let models: Vec<String> = models.into_iter().map(|m| m.name).collect();
            log::info!("connection test successful: {} models found", models.len());
            ConnectionStatus {
                connected: true,
                models_found: models.len(),
                models,
                error: None,
            }
        }
        Err(e) => {
            log::error!("connection test failed: {e}");
            ConnectionStatus {
                connected: false,
                models_found: 0,
                models: vec![],
                error: Some(e.to_string()),
            }
        }
    }
}
