use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Setting names understood by the application.
///
/// Persisted files may carry additional keys; those are preserved untouched.
pub mod keys {
    pub const VERSION: &str = "version";
    pub const PREFERRED_MODEL: &str = "preferred_model";
    pub const USE_CLOUD: &str = "use_cloud";
    pub const CLOUD_ENDPOINT: &str = "cloud_endpoint";
    pub const LOCAL_ENDPOINT: &str = "local_endpoint";
    pub const SPEECH_TIMEOUT: &str = "speech_timeout";
    pub const PHRASE_TIME_LIMIT: &str = "phrase_time_limit";
    pub const AMBIENT_NOISE_DURATION: &str = "ambient_noise_duration";
    pub const SPANISH_DIALECT: &str = "spanish_dialect";
    pub const ENGLISH_DIALECT: &str = "english_dialect";
    pub const SPEECH_SPEED: &str = "speech_speed";
    pub const MAX_CONVERSATION_HISTORY: &str = "max_conversation_history";
    pub const AUTO_PLAY_AUDIO: &str = "auto_play_audio";
    pub const SHOW_TIMESTAMPS: &str = "show_timestamps";
    pub const LOG_LEVEL: &str = "log_level";
    pub const THEME: &str = "theme";
}

pub const CONFIG_VERSION: &str = "1.0.0";
pub const DEFAULT_PREFERRED_MODEL: &str = "deepseek-v3.1:671b-cloud";
pub const DEFAULT_CLOUD_ENDPOINT: &str = "https://ollama.com";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MAX_CONVERSATION_HISTORY: usize = 50;

/// Environment-style key under which the cloud API key is stored.
pub const OLLAMA_API_KEY: &str = "OLLAMA_API_KEY";

/// A single persisted setting.
///
/// Variant order matters for untagged decoding: integers must be tried before floats so
/// `10` stays an `Int` and integers past `i64::MAX` stay exact as `UInt`. `Raw` catches
/// anything non-scalar written by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Raw(serde_json::Value),
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<u64> for ConfigValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => ConfigValue::Int(v),
            Err(_) => ConfigValue::UInt(v),
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Text(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Text(v)
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(v) => write!(f, "{v}"),
            ConfigValue::Int(v) => write!(f, "{v}"),
            ConfigValue::UInt(v) => write!(f, "{v}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::Text(v) => f.write_str(v),
            ConfigValue::Raw(v) => write!(f, "{v}"),
        }
    }
}

impl ConfigValue {
    /// Interpret a user-typed string (e.g. from a CLI `config set`) as the most specific scalar.
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return ConfigValue::Bool(true),
            "false" => return ConfigValue::Bool(false),
            _ => {}
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return ConfigValue::Int(v);
        }
        if let Ok(v) = trimmed.parse::<u64>() {
            return ConfigValue::UInt(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            if v.is_finite() {
                return ConfigValue::Float(v);
            }
        }
        ConfigValue::Text(raw.to_string())
    }
}

/// Flat settings map, persisted as a JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, ConfigValue>);

impl Configuration {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Overlay `persisted` on top of `defaults`.
    ///
    /// Every default key ends up present; persisted values win; unknown persisted keys survive.
    pub fn merged_over(defaults: &Configuration, persisted: Configuration) -> Self {
        let mut out = defaults.0.clone();
        out.extend(persisted.0);
        Self(out)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ConfigValue::Bool(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v != 0),
            ConfigValue::UInt(v) => Some(*v != 0),
            ConfigValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ConfigValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ConfigValue::Int(v) => Some(*v),
            ConfigValue::UInt(v) => i64::try_from(*v).ok(),
            ConfigValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v as f64),
            ConfigValue::UInt(v) => Some(*v as f64),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn use_cloud(&self) -> bool {
        self.get_bool(keys::USE_CLOUD).unwrap_or(false)
    }

    pub fn preferred_model(&self) -> &str {
        self.get_str(keys::PREFERRED_MODEL)
            .unwrap_or(DEFAULT_PREFERRED_MODEL)
    }

    pub fn cloud_endpoint(&self) -> &str {
        non_empty(self.get_str(keys::CLOUD_ENDPOINT)).unwrap_or(DEFAULT_CLOUD_ENDPOINT)
    }

    pub fn local_endpoint(&self) -> &str {
        non_empty(self.get_str(keys::LOCAL_ENDPOINT)).unwrap_or(DEFAULT_LOCAL_ENDPOINT)
    }

    pub fn max_conversation_history(&self) -> usize {
        self.get_i64(keys::MAX_CONVERSATION_HISTORY)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(DEFAULT_MAX_CONVERSATION_HISTORY)
    }

    pub fn log_level(&self) -> &str {
        self.get_str(keys::LOG_LEVEL).unwrap_or("INFO")
    }

    pub fn speech_slow(&self) -> bool {
        self.get_bool(keys::SPEECH_SPEED).unwrap_or(false)
    }

    pub fn show_timestamps(&self) -> bool {
        self.get_bool(keys::SHOW_TIMESTAMPS).unwrap_or(false)
    }

    /// Recognizer settings for the given input language.
    pub fn speech_settings(&self, spanish_input: bool) -> SpeechSettings {
        let language = if spanish_input {
            self.get_str(keys::SPANISH_DIALECT).unwrap_or("es-ES")
        } else {
            self.get_str(keys::ENGLISH_DIALECT).unwrap_or("en-US")
        };

        SpeechSettings {
            language: language.to_string(),
            timeout_secs: self
                .get_i64(keys::SPEECH_TIMEOUT)
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(10),
            phrase_limit_secs: self
                .get_i64(keys::PHRASE_TIME_LIMIT)
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(15),
            ambient_duration_secs: self.get_f64(keys::AMBIENT_NOISE_DURATION).unwrap_or(0.5),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Parameters handed to an external speech recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub language: String,
    pub timeout_secs: u64,
    pub phrase_limit_secs: u64,
    pub ambient_duration_secs: f64,
}

/// Credentials keyed by environment-variable-style names. Never merged with defaults.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secrets(BTreeMap<String, String>);

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "[REDACTED]")))
            .finish()
    }
}

impl Secrets {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Missing keys read as the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Secrets {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
