use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use habla_core::config::{ConfigValue, Configuration};

use crate::atomic::write_atomic;
use crate::defaults::default_configuration;
use crate::error::StoreError;

/// JSON-backed settings with a load-once cache.
///
/// The cache and every write go through one lock, so concurrent sessions see a single writer.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    defaults: Configuration,
    cache: Mutex<Option<Configuration>>,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defaults: default_configuration(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_defaults(mut self, defaults: Configuration) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &Configuration {
        &self.defaults
    }

    /// Cached configuration, reading the file on first use.
    ///
    /// Missing file: defaults are written back. Unreadable or corrupt file: defaults are used in
    /// memory and the file is left as-is for the user to inspect.
    pub fn load(&self) -> Configuration {
        let mut cache = self.lock();
        if let Some(cfg) = cache.as_ref() {
            return cfg.clone();
        }

        let cfg = match self.read_persisted() {
            Ok(Some(persisted)) => {
                let merged = Configuration::merged_over(&self.defaults, persisted);
                log::debug!("configuration loaded: {} settings", merged.len());
                merged
            }
            Ok(None) => {
                log::info!("no config file found, creating defaults at {}", self.path.display());
                if let Err(e) = self.write(&self.defaults) {
                    log::error!("[{}] {e}", e.category());
                }
                self.defaults.clone()
            }
            Err(e) => {
                log::error!("[{}] {e}; using defaults", e.category());
                self.defaults.clone()
            }
        };

        *cache = Some(cfg.clone());
        cfg
    }

    pub fn reload(&self) -> Configuration {
        self.lock().take();
        self.load()
    }

    /// Persist the full configuration. `false` means nothing was changed on disk.
    pub fn save(&self, cfg: &Configuration) -> bool {
        let mut cache = self.lock();
        log::info!("saving configuration to {}", self.path.display());
        match self.write(cfg) {
            Ok(()) => {
                *cache = Some(cfg.clone());
                true
            }
            Err(e) => {
                log::error!("[{}] {e}", e.category());
                false
            }
        }
    }

    /// Defaults become the active configuration even when they cannot be written; `false`
    /// reports that the file still holds the previous settings.
    pub fn reset(&self) -> (Configuration, bool) {
        log::info!("resetting configuration to defaults");
        let defaults = self.defaults.clone();
        let saved = self.save(&defaults);
        if !saved {
            *self.lock() = Some(defaults.clone());
        }
        (defaults, saved)
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.load().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<ConfigValue>) -> bool {
        let mut cfg = self.load();
        cfg.insert(key, value);
        self.save(&cfg)
    }

    fn read_persisted(&self) -> Result<Option<Configuration>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        log::info!("loading config from {}", self.path.display());
        let cfg = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(cfg))
    }

    fn write(&self, cfg: &Configuration) -> Result<(), StoreError> {
        let mut json = serde_json::to_vec_pretty(cfg).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            detail: format!("encode config JSON: {e}"),
        })?;
        json.push(b'\n');

        write_atomic(&self.path, &json, None).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            detail: format!("{e:#}"),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Configuration>> {
        // A panic while holding the lock cannot leave the cache half-written.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}
