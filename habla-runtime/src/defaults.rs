use habla_core::config::{
    CONFIG_VERSION, Configuration, DEFAULT_CLOUD_ENDPOINT, DEFAULT_LOCAL_ENDPOINT,
    DEFAULT_MAX_CONVERSATION_HISTORY, DEFAULT_PREFERRED_MODEL, keys,
};

/// The settings every loaded configuration is guaranteed to contain.
///
/// Adding a key here is enough for older config files to pick it up on next load.
pub fn default_configuration() -> Configuration {
    Configuration::new()
        .with(keys::VERSION, CONFIG_VERSION)
        .with(keys::PREFERRED_MODEL, DEFAULT_PREFERRED_MODEL)
        .with(keys::USE_CLOUD, false)
        .with(keys::CLOUD_ENDPOINT, DEFAULT_CLOUD_ENDPOINT)
        .with(keys::LOCAL_ENDPOINT, DEFAULT_LOCAL_ENDPOINT)
        .with(keys::SPEECH_TIMEOUT, 10_i64)
        .with(keys::PHRASE_TIME_LIMIT, 15_i64)
        .with(keys::AMBIENT_NOISE_DURATION, 0.5_f64)
        .with(keys::SPANISH_DIALECT, "es-ES")
        .with(keys::ENGLISH_DIALECT, "en-US")
        .with(keys::SPEECH_SPEED, false)
        .with(
            keys::MAX_CONVERSATION_HISTORY,
            DEFAULT_MAX_CONVERSATION_HISTORY as i64,
        )
        .with(keys::AUTO_PLAY_AUDIO, true)
        .with(keys::SHOW_TIMESTAMPS, false)
        .with(keys::LOG_LEVEL, "INFO")
        .with(keys::THEME, "light")
}
