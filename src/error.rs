use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: OID {oid} is defined twice (lines {first_line} and {second_line})")]
    DuplicateOid {
        oid: String,
        first_line: usize,
        second_line: usize,
    },

    #[error("Missing certificate: {filename} not found at {}", .path.display())]
    MissingCertificate { filename: String, path: PathBuf },

    #[error("External tool failed: `{command}`: {reason}")]
    ExternalTool { command: String, reason: String },

    #[error("Verification error at {key}: wrote {expected}, read back {actual}")]
    Verification {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("Staging error: missing required asset inputs in {}: {}", .dir.display(), .files.join(", "))]
    MissingAssetInputs { dir: PathBuf, files: Vec<String> },

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for errors produced by the trust database circuit-breaker
    pub fn is_verification(&self) -> bool {
        matches!(self, PipelineError::Verification { .. })
    }

    /// Log security-critical errors on the dedicated target
    pub fn log_if_security_critical(&self) {
        if self.is_verification() {
            tracing::error!(target: "security", "TRUST DATABASE VERIFICATION FAILED: {}", self);
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
