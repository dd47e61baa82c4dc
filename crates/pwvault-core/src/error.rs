//! Error types for pwvault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// Messages may carry field names and lengths, never plaintext, keys or passwords.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Malformed base64, truncated blob, unknown wallet shape or bad JSON
    #[error("Invalid format: {0}")]
    Format(String),

    /// AEAD tag mismatch (wrong password or tampered data)
    #[error("Wrong password or corrupted data")]
    AuthenticationFailure,

    /// HMAC mismatch on a legacy signed wallet
    #[error("Wrong password or corrupted data")]
    IntegrityFailure,

    /// Invalid caller input (empty password, zero iterations, bad key length)
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Operation cancelled - no secret was provided")]
    Cancelled,

    #[error("Wallet is not signed and unsigned imports are disabled")]
    UnsignedRejected,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crypto task failed: {0}")]
    Task(String),
}

impl VaultError {
    /// True for the failures a user should see as "wrong password or corrupted data"
    pub fn is_wrong_secret(&self) -> bool {
        matches!(self, Self::AuthenticationFailure | Self::IntegrityFailure)
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
