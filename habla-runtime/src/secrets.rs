use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use habla_core::config::Secrets;

use crate::atomic::write_atomic;
use crate::error::StoreError;

const HEADER: &str = "# Spanish Tutor environment variables\n\
# DO NOT SHARE THIS FILE - IT CONTAINS SENSITIVE API KEYS\n\
# Written by habla; edit with care\n";

#[cfg(unix)]
const OWNER_ONLY: Option<u32> = Some(0o600);
#[cfg(not(unix))]
const OWNER_ONLY: Option<u32> = None;

/// Line-oriented `KEY=VALUE` credential file with a project-local override.
///
/// Resolution is fixed: when the project file exists it is the only file consulted, otherwise
/// the per-user file is. Saves go to whichever file loads would read, so a saved key is never
/// shadowed by the other location.
#[derive(Debug)]
pub struct SecretsStore {
    home_path: PathBuf,
    project_path: Option<PathBuf>,
    cache: Mutex<Option<Secrets>>,
}

impl SecretsStore {
    pub fn new(home_path: impl Into<PathBuf>, project_path: Option<PathBuf>) -> Self {
        Self {
            home_path: home_path.into(),
            project_path,
            cache: Mutex::new(None),
        }
    }

    pub fn home_path(&self) -> &Path {
        &self.home_path
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// The file loads read from and saves write to.
    pub fn active_path(&self) -> &Path {
        match self.project_path.as_deref() {
            Some(p) if p.exists() => p,
            _ => &self.home_path,
        }
    }

    pub fn load_secrets(&self) -> Secrets {
        let mut cache = self.lock();
        if let Some(s) = cache.as_ref() {
            return s.clone();
        }

        let path = self.active_path().to_path_buf();
        let secrets = match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("loading secrets from {}", path.display());
                let s = parse_env(&text);
                log::debug!("loaded {} secret entries", s.len());
                s
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no secrets file found");
                Secrets::new()
            }
            Err(source) => {
                let e = StoreError::Read { path, source };
                log::error!("[{}] {e}", e.category());
                Secrets::new()
            }
        };

        *cache = Some(secrets.clone());
        secrets
    }

    pub fn reload_secrets(&self) -> Secrets {
        self.lock().take();
        self.load_secrets()
    }

    pub fn save_secrets(&self, secrets: &Secrets) -> bool {
        let mut cache = self.lock();
        let path = self.active_path().to_path_buf();
        log::info!("saving secrets to {}", path.display());

        match write_atomic(&path, render_env(secrets).as_bytes(), OWNER_ONLY) {
            Ok(()) => {
                log::debug!("saved {} secret entries", secrets.len());
                *cache = Some(secrets.clone());
                true
            }
            Err(e) => {
                let e = StoreError::Write {
                    path,
                    detail: format!("{e:#}"),
                };
                log::error!("[{}] {e}", e.category());
                false
            }
        }
    }

    /// Empty string when the key (or the whole file) is absent.
    pub fn get_secret(&self, key: &str) -> String {
        let value = self.load_secrets().get(key).to_string();
        if value.is_empty() {
            log::debug!("secret {key} not set");
        }
        value
    }

    /// Set one key and persist. An empty value removes the key.
    pub fn set_secret(&self, key: &str, value: &str) -> bool {
        let mut secrets = self.load_secrets();
        let value = value.trim();
        if value.is_empty() {
            secrets.remove(key);
        } else {
            secrets.insert(key, value);
        }
        self.save_secrets(&secrets)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Secrets>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Parse `KEY=VALUE` lines. Blank and `#` lines are skipped; malformed lines are logged and
/// skipped.
pub fn parse_env(text: &str) -> Secrets {
    let mut out = Secrets::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                out.insert(key.trim(), value.trim());
            }
            _ => log::warn!("invalid format in secrets file line {}", idx + 1),
        }
    }
    out
}

/// Header plus sorted `KEY=VALUE` lines. Entries that could not be read back are dropped.
pub fn render_env(secrets: &Secrets) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (key, value) in secrets.iter() {
        let key = key.trim();
        if key.is_empty() || key.contains('=') || key.starts_with('#') {
            log::warn!("skipping secret with unusable key {key:?}");
            continue;
        }
        if key.contains(['\n', '\r']) || value.contains(['\n', '\r']) {
            log::warn!("skipping secret {key:?}: line breaks are not supported");
            continue;
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value.trim());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use habla_core::config::OLLAMA_API_KEY;

    #[test]
    fn parse_skips_comments_blanks_and_garbage() {
        let s = parse_env(
            "# header\n\n OLLAMA_API_KEY = abc=def \nnot a pair\n=novalue\nOTHER=x\n",
        );
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(OLLAMA_API_KEY), "abc=def");
        assert_eq!(s.get("OTHER"), "x");
    }

    #[test]
    fn missing_store_yields_empty_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretsStore::new(dir.path().join(".env.txt"), None);
        assert_eq!(store.get_secret(OLLAMA_API_KEY), "");
        assert!(store.load_secrets().is_empty());

        std::fs::write(dir.path().join(".env.txt"), "").unwrap();
        assert_eq!(store.reload_secrets().get(OLLAMA_API_KEY), "");
    }

    #[test]
    fn project_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home.env");
        let project = dir.path().join("project.env");
        std::fs::write(&home, "OLLAMA_API_KEY=home\n").unwrap();

        let store = SecretsStore::new(&home, Some(project.clone()));
        assert_eq!(store.active_path(), home.as_path());
        assert_eq!(store.get_secret(OLLAMA_API_KEY), "home");

        std::fs::write(&project, "OLLAMA_API_KEY=project\n").unwrap();
        assert_eq!(store.active_path(), project.as_path());
        assert_eq!(store.reload_secrets().get(OLLAMA_API_KEY), "project");
    }

    #[test]
    fn save_writes_header_sorted_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join(".env.txt");
        let store = SecretsStore::new(&path, None);

        let mut s = Secrets::new();
        s.insert("ZED", "1");
        s.insert(OLLAMA_API_KEY, "k-123");
        assert!(store.save_secrets(&s));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Spanish Tutor environment variables"));
        assert!(text.contains("DO NOT SHARE"));
        let ollama = text.find("OLLAMA_API_KEY=k-123").unwrap();
        let zed = text.find("ZED=1").unwrap();
        assert!(ollama < zed);

        let fresh = SecretsStore::new(&path, None);
        assert_eq!(fresh.load_secrets(), s);
    }

    #[test]
    fn set_secret_updates_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretsStore::new(dir.path().join(".env.txt"), None);
        assert!(store.set_secret(OLLAMA_API_KEY, "  abc "));
        assert_eq!(store.reload_secrets().get(OLLAMA_API_KEY), "abc");
        assert!(store.set_secret(OLLAMA_API_KEY, ""));
        assert_eq!(store.reload_secrets().get(OLLAMA_API_KEY), "");
    }

    #[test]
    fn render_drops_unrepresentable_entries() {
        let mut s = Secrets::new();
        s.insert("GOOD", "v");
        s.insert("BAD", "line1\nline2");
        s.insert("A=B", "v");
        let text = render_env(&s);
        assert!(text.contains("GOOD=v\n"));
        assert!(!text.contains("BAD"));
        assert!(!text.contains("A=B"));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.txt");
        let store = SecretsStore::new(&path, None);
        assert!(store.set_secret(OLLAMA_API_KEY, "k"));
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
