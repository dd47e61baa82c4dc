//! Terminal implementation of the secret prompt

use async_trait::async_trait;
use tracing::warn;

use pwvault_core::{SecretPrompt, SecretPurpose, SecretString};

/// Reads secrets from the controlling terminal without echo
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Ask once, and again for confirmation when required
    ///
    /// An empty answer, a mismatch or a terminal error yields `None`.
    pub fn ask_blocking(title: &str, requires_confirmation: bool) -> Option<SecretString> {
        let first = match rpassword::prompt_password(format!("{}: ", title)) {
            Ok(value) => SecretString::new(value),
            Err(e) => {
                warn!("Could not read from terminal: {}", e);
                return None;
            }
        };

        if first.is_empty() {
            return None;
        }

        if requires_confirmation {
            let second = rpassword::prompt_password("Confirm: ")
                .map(SecretString::new)
                .ok()?;
            if first != second {
                eprintln!("Passwords do not match.");
                return None;
            }
        }

        Some(first)
    }

    /// [`Self::ask_blocking`] on the blocking pool
    pub async fn ask(title: &'static str, requires_confirmation: bool) -> Option<SecretString> {
        tokio::task::spawn_blocking(move || Self::ask_blocking(title, requires_confirmation))
            .await
            .ok()
            .flatten()
    }
}

#[async_trait]
impl SecretPrompt for TerminalPrompt {
    async fn ask_secret(
        &self,
        purpose: SecretPurpose,
        requires_confirmation: bool,
    ) -> Option<SecretString> {
        Self::ask(purpose.title(), requires_confirmation).await
    }
}
