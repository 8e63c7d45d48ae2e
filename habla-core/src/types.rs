use serde::{Deserialize, Serialize};

/// A cloud-hosted model from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub description: String,
}

/// A model installed in the local model service.
///
/// The service reports entries in a couple of shapes; they collapse to this at the wire boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalModel {
    pub name: String,
}

impl LocalModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    ServiceUnavailable,
    MissingCredential,
    InvalidCredential,
    UnknownModel,
    ConfigCorrupt,
    IoFailure,
    Unknown,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::ServiceUnavailable => "service_unavailable",
            FailureCategory::MissingCredential => "missing_credential",
            FailureCategory::InvalidCredential => "invalid_credential",
            FailureCategory::UnknownModel => "unknown_model",
            FailureCategory::ConfigCorrupt => "config_corrupt",
            FailureCategory::IoFailure => "io_failure",
            FailureCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one backend call, shown to the user either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendOutcome {
    Success(String),
    Failure {
        category: FailureCategory,
        message: String,
    },
}

impl BackendOutcome {
    pub fn failure(category: FailureCategory, message: impl Into<String>) -> Self {
        BackendOutcome::Failure {
            category,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BackendOutcome::Success(_))
    }

    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            BackendOutcome::Success(_) => None,
            BackendOutcome::Failure { category, .. } => Some(*category),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            BackendOutcome::Success(text) => text,
            BackendOutcome::Failure { message, .. } => message,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            BackendOutcome::Success(text) => text,
            BackendOutcome::Failure { message, .. } => message,
        }
    }
}

/// Snapshot reported by the connection probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub models_found: usize,
    pub models: Vec<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_is_the_message() {
        let out = BackendOutcome::failure(FailureCategory::UnknownModel, "Error: nope");
        assert!(!out.is_success());
        assert_eq!(out.category(), Some(FailureCategory::UnknownModel));
        assert_eq!(out.into_text(), "Error: nope");
    }
}
