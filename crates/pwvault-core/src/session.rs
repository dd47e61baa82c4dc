//! Session-scoped master password
//!
//! The master password is held for the lifetime of a logged-in session and
//! handed to every per-entry encrypt/decrypt call. One writer (login/logout),
//! many concurrent readers; `clear()` on logout drops and zeroes it.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{decrypt_string, encrypt_string, SecretString, DEFAULT_ITERATIONS};
use crate::error::{Result, VaultError};

/// Cloneable handle to the session's master password
#[derive(Clone)]
pub struct SessionSecret {
    secret: Arc<RwLock<Option<SecretString>>>,
    iterations: u32,
}

impl SessionSecret {
    /// Create an empty session using the default per-entry iteration count
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    /// Create an empty session with a custom per-entry iteration count
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            secret: Arc::new(RwLock::new(None)),
            iterations,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Start a session with the given master password
    pub async fn begin(&self, password: SecretString) -> Result<()> {
        if password.is_empty() {
            return Err(VaultError::contract("master password must not be empty"));
        }
        *self.secret.write().await = Some(password);
        debug!("Session secret set");
        Ok(())
    }

    /// End the session (called on logout)
    pub async fn clear(&self) {
        // Dropping the SecretString zeroes it
        self.secret.write().await.take();
        debug!("Session secret cleared");
    }

    pub async fn is_active(&self) -> bool {
        self.secret.read().await.is_some()
    }

    async fn current(&self) -> Result<SecretString> {
        self.secret
            .read()
            .await
            .clone()
            .ok_or_else(|| VaultError::contract("no active session"))
    }

    /// Encrypt a value into a per-entry blob under the master password
    pub async fn encrypt_value(&self, plaintext: &str) -> Result<String> {
        let password = self.current().await?;
        let plaintext = Zeroizing::new(plaintext.to_string());
        let iterations = self.iterations;

        tokio::task::spawn_blocking(move || {
            encrypt_string(&plaintext, password.expose(), iterations)
        })
        .await?
    }

    /// Decrypt a per-entry blob under the master password
    pub async fn decrypt_value(&self, blob: &str) -> Result<SecretString> {
        let password = self.current().await?;
        let blob = blob.to_string();
        let iterations = self.iterations;

        tokio::task::spawn_blocking(move || {
            decrypt_string(&blob, password.expose(), iterations)
        })
        .await?
    }
}

impl Default for SessionSecret {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSecret")
            .field("secret", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[tokio::test]
    async fn test_begin_and_clear() {
        let session = SessionSecret::with_iterations(FAST);
        assert!(!session.is_active().await);

        session.begin(SecretString::from("master")).await.unwrap();
        assert!(session.is_active().await);

        session.clear().await;
        assert!(!session.is_active().await);
    }

    #[tokio::test]
    async fn test_empty_master_rejected() {
        let session = SessionSecret::new();
        assert!(matches!(
            session.begin(SecretString::from("")).await,
            Err(VaultError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_value_roundtrip() {
        let session = SessionSecret::with_iterations(FAST);
        session.begin(SecretString::from("master")).await.unwrap();

        let blob = session.encrypt_value("hunter2").await.unwrap();
        let value = session.decrypt_value(&blob).await.unwrap();

        assert_eq!(value.expose(), "hunter2");
    }

    #[tokio::test]
    async fn test_cleared_session_cannot_encrypt() {
        let session = SessionSecret::with_iterations(FAST);
        session.begin(SecretString::from("master")).await.unwrap();
        let clone = session.clone();
        session.clear().await;

        assert!(matches!(
            clone.encrypt_value("x").await,
            Err(VaultError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_entries_are_independent() {
        let session = SessionSecret::with_iterations(FAST);
        session.begin(SecretString::from("master")).await.unwrap();

        let (a, b) = tokio::join!(session.encrypt_value("one"), session.encrypt_value("two"));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a, b);

        assert_eq!(session.decrypt_value(&a).await.unwrap().expose(), "one");
        assert_eq!(session.decrypt_value(&b).await.unwrap().expose(), "two");
    }

    #[test]
    fn test_debug_redacted() {
        let debug = format!("{:?}", SessionSecret::new());
        assert!(debug.contains("REDACTED"));
    }
}
