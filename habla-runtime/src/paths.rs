use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::UserDirs;

pub const APP_DIR_NAME: &str = ".spanish_tutor";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SECRETS_FILE_NAME: &str = ".env.txt";
pub const LOGS_DIR_NAME: &str = "logs";

/// Where every persisted file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub app_dir: PathBuf,
    pub config_file: PathBuf,
    pub secrets_file: PathBuf,
    /// Checked first when present; see [`crate::secrets::SecretsStore`].
    pub project_secrets_file: Option<PathBuf>,
    pub logs_dir: PathBuf,
    pub manifests_dir: PathBuf,
}

impl AppPaths {
    pub fn from_home(home: &Path, project_dir: Option<&Path>) -> Self {
        let app_dir = home.join(APP_DIR_NAME);
        Self {
            config_file: app_dir.join(CONFIG_FILE_NAME),
            secrets_file: app_dir.join(SECRETS_FILE_NAME),
            project_secrets_file: project_dir.map(|d| d.join(SECRETS_FILE_NAME)),
            logs_dir: app_dir.join(LOGS_DIR_NAME),
            manifests_dir: default_manifests_dir(home),
            app_dir,
        }
    }

    /// Resolve from the user's home directory and the process working directory.
    pub fn discover() -> anyhow::Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("could not determine the home directory")?;
        let cwd = std::env::current_dir().ok();
        let mut paths = Self::from_home(&home, cwd.as_deref());

        if let Some(models) = std::env::var_os("OLLAMA_MODELS").filter(|v| !v.is_empty()) {
            paths.manifests_dir = manifests_under(Path::new(&models));
        }
        Ok(paths)
    }

    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        crate::atomic::ensure_dir(&self.app_dir)?;
        crate::atomic::ensure_dir(&self.logs_dir)
    }
}

fn default_manifests_dir(home: &Path) -> PathBuf {
    manifests_under(&home.join(".ollama").join("models"))
}

fn manifests_under(models_root: &Path) -> PathBuf {
    models_root
        .join("manifests")
        .join("registry.ollama.ai")
        .join("library")
}
