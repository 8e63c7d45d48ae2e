use habla_core::types::FailureCategory;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {detail}", .path.display())]
    Write { path: PathBuf, detail: String },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn category(&self) -> FailureCategory {
        match self {
            StoreError::Read { .. } | StoreError::Write { .. } => FailureCategory::IoFailure,
            StoreError::Corrupt { .. } => FailureCategory::ConfigCorrupt,
        }
    }
}
