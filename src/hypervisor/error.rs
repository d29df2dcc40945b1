use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HypervisorError {
    #[error("failed to connect to {uri}: {reason}")]
    Connect { uri: String, reason: String },

    #[error("domain not found: {0}")]
    NotFound(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("{op} failed: {reason}")]
    Call { op: &'static str, reason: String },

    #[error("malformed domain descriptor: {0}")]
    Descriptor(String),
}

impl HypervisorError {
    pub fn call(op: &'static str, reason: impl ToString) -> Self {
        HypervisorError::Call { op, reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, HypervisorError>;
