pub mod atomic;
pub mod config_store;
pub mod defaults;
pub mod error;
pub mod llm;
pub mod logs;
pub mod models;
pub mod paths;
pub mod secrets;

pub use config_store::ConfigStore;
pub use error::StoreError;
pub use llm::{OllamaCloudService, OllamaLocalService};
pub use models::ModelDiscovery;
pub use paths::AppPaths;
pub use secrets::SecretsStore;
