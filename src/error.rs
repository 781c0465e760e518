use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Crate-wide error taxonomy.
///
/// Business-rule failures are structural variants so callers can map them to
/// a transport status without inspecting message text. Infrastructure errors
/// (`Io`, `Csv`, `Storage`, `Internal`) stay distinct from business failures
/// and never expose internal detail beyond their source.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),
    #[error("media attachment not found: {0}")]
    MediaNotFound(String),
    #[error("insufficient credits: account {account} has {available}, needs {required}")]
    InsufficientCredits {
        account: String,
        required: u64,
        available: u64,
    },
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("store conflict: {0}")]
    Conflict(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into().into())
    }

    /// True for failures caused by the request itself rather than the system.
    pub fn is_business_failure(&self) -> bool {
        match self {
            Self::Io(_) | Self::Csv(_) | Self::Internal(_) => false,
            #[cfg(feature = "storage-rocksdb")]
            Self::Storage(_) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_failure_classification() {
        let short = LedgerError::InsufficientCredits {
            account: "a".into(),
            required: 5,
            available: 1,
        };
        assert!(short.is_business_failure());
        assert!(!LedgerError::internal("boom").is_business_failure());
        assert!(!LedgerError::Io(std::io::Error::other("down")).is_business_failure());
    }
}
