//! Request/response boundary for asking the host for a secret

use async_trait::async_trait;

use crate::crypto::SecretString;

/// Why a secret is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPurpose {
    /// Choose a password for a new wallet file
    ExportWallet,
    /// Password of an encrypted wallet being imported
    ImportWallet,
    /// Password used to sign a legacy wallet
    VerifySignature,
}

impl SecretPurpose {
    /// Human-readable prompt text
    pub fn title(&self) -> &'static str {
        match self {
            Self::ExportWallet => "Choose a password for the wallet file",
            Self::ImportWallet => "Enter the wallet password to import",
            Self::VerifySignature => "Enter the wallet password to verify its signature",
        }
    }
}

/// Host-provided secret prompt
///
/// Returning `None` aborts the operation cleanly with nothing produced.
#[async_trait]
pub trait SecretPrompt: Send + Sync {
    async fn ask_secret(
        &self,
        purpose: SecretPurpose,
        requires_confirmation: bool,
    ) -> Option<SecretString>;
}
