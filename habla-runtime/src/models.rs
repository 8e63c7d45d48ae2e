use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use habla_core::catalog::cloud_models;
use habla_core::types::ModelDescriptor;
use habla_engine::traits::LocalModelService;

/// Installed-model discovery: the service catalog first, the manifest tree on disk second.
#[derive(Clone)]
pub struct ModelDiscovery {
    local: Arc<dyn LocalModelService>,
    manifests_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ModelDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDiscovery")
            .field("manifests_dir", &self.manifests_dir)
            .finish_non_exhaustive()
    }
}

impl ModelDiscovery {
    pub fn new(local: Arc<dyn LocalModelService>, manifests_dir: Option<PathBuf>) -> Self {
        Self {
            local,
            manifests_dir,
        }
    }

    pub fn manifests_dir(&self) -> Option<&Path> {
        self.manifests_dir.as_deref()
    }

    /// Sorted, de-duplicated model names. Empty when neither source yields anything.
    ///
    /// The filesystem is only consulted when the service call fails; a reachable service with
    /// no models is reported as-is.
    pub async fn list_local_models(&self, endpoint: &str) -> Vec<String> {
        let names = match self.local.list_models(endpoint).await {
            Ok(models) => {
                log::info!("found {} models via the model service", models.len());
                models.into_iter().map(|m| m.name).collect()
            }
            Err(e) => {
                log::warn!("model service listing failed: {e}; scanning manifests");
                match self.manifests_dir.as_deref() {
                    Some(dir) => scan_manifests(dir),
                    None => vec![],
                }
            }
        };

        let sorted: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if sorted.is_empty() {
            log::warn!("no local models found");
        }
        sorted
    }

    pub fn list_cloud_models(&self) -> Vec<ModelDescriptor> {
        cloud_models()
    }
}

/// Model directory names directly under the manifest root. Hidden entries are skipped.
pub fn scan_manifests(dir: &Path) -> Vec<String> {
    let Ok(models) = fs::read_dir(dir) else {
        log::debug!("no manifest directory at {}", dir.display());
        return vec![];
    };

    let out: Vec<String> = models
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();

    log::info!("found {} models in the manifest directory", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use habla_core::types::LocalModel;
    use habla_engine::traits::BackendError;

    struct Catalog(Result<Vec<LocalModel>, BackendError>);

    #[async_trait]
    impl LocalModelService for Catalog {
        async fn list_models(&self, _endpoint: &str) -> Result<Vec<LocalModel>, BackendError> {
            self.0.clone()
        }

        async fn chat(
            &self,
            _endpoint: &str,
            _model: &str,
            _system_message: &str,
            _user_message: &str,
        ) -> Result<String, BackendError> {
            Err(BackendError::Protocol("unused".into()))
        }
    }

    fn manifests() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (model, tag) in [("llama3", "latest"), ("qwen2", "7b"), ("llama3", "8b")] {
            let d = dir.path().join(model);
            fs::create_dir_all(&d).unwrap();
            fs::write(d.join(tag), b"{}").unwrap();
        }
        // A pulled-but-untagged folder still counts as a model.
        fs::create_dir_all(dir.path().join("mistral")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("stray-file"), b"").unwrap();
        dir
    }

    #[tokio::test]
    async fn service_results_are_sorted_and_unique() {
        let svc = Catalog(Ok(vec![
            LocalModel::new("model-b"),
            LocalModel::new("model-a"),
            LocalModel::new("model-b"),
        ]));
        let d = ModelDiscovery::new(Arc::new(svc), None);
        assert_eq!(
            d.list_local_models("http://localhost:11434").await,
            vec!["model-a", "model-b"]
        );
    }

    #[tokio::test]
    async fn falls_back_to_manifests_when_service_fails() {
        let dir = manifests();
        let svc = Catalog(Err(BackendError::Unreachable("refused".into())));
        let d = ModelDiscovery::new(Arc::new(svc), Some(dir.path().to_path_buf()));
        assert_eq!(
            d.list_local_models("http://localhost:11434").await,
            vec!["llama3", "mistral", "qwen2"]
        );
    }

    #[tokio::test]
    async fn empty_service_catalog_skips_fallback() {
        let dir = manifests();
        let svc = Catalog(Ok(vec![]));
        let d = ModelDiscovery::new(Arc::new(svc), Some(dir.path().to_path_buf()));
        assert!(d.list_local_models("http://localhost:11434").await.is_empty());
    }

    #[tokio::test]
    async fn nothing_anywhere_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let svc = Catalog(Err(BackendError::Unreachable("refused".into())));
        let d = ModelDiscovery::new(Arc::new(svc), Some(dir.path().join("missing")));
        assert!(d.list_local_models("http://localhost:11434").await.is_empty());
    }

    #[test]
    fn manifest_scan_lists_model_folders() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("llama3")).unwrap();
        fs::write(dir.path().join("llama3").join("latest"), b"{}").unwrap();
        fs::create_dir_all(dir.path().join("mistral")).unwrap();

        let mut names = scan_manifests(dir.path());
        names.sort();
        assert_eq!(names, vec!["llama3", "mistral"]);
    }

    #[test]
    fn cloud_catalog_is_fixed() {
        let d = ModelDiscovery::new(Arc::new(Catalog(Ok(vec![]))), None);
        let names: Vec<_> = d.list_cloud_models().into_iter().map(|m| m.name).collect();
        assert!(names.contains(&"deepseek-v3.1:671b-cloud".to_string()));
        assert_eq!(names.len(), 4);
    }
}
