//! Password entry type definitions

use serde::{Deserialize, Serialize};

use super::strength::{calculate_entropy, Charset, EntropyLevel};
use crate::crypto::SecretString;
use crate::error::Result;
use crate::session::SessionSecret;

/// Decrypted password entry as it travels inside a wallet
///
/// Every field defaults when absent so minimal `{title, site, password}`
/// records import cleanly. Timestamps are kept exactly as the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordEntry {
    pub title: String,
    pub site: String,
    /// Plaintext password - zeroed when the entry is dropped
    pub password: SecretString,
    pub length: u32,
    pub use_uppercase: bool,
    pub use_lowercase: bool,
    pub use_digits: bool,
    pub use_special: bool,
    pub entropy: f64,
    pub expiration_date: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl PasswordEntry {
    /// Create an entry with only the identifying fields set
    pub fn new(title: &str, site: &str, password: &str) -> Self {
        Self {
            title: title.to_string(),
            site: site.to_string(),
            password: SecretString::from(password),
            ..Self::default()
        }
    }

    pub fn charset(&self) -> Charset {
        Charset {
            uppercase: self.use_uppercase,
            lowercase: self.use_lowercase,
            digits: self.use_digits,
            special: self.use_special,
        }
    }

    /// Stored entropy, or an estimate from length and charset when none was recorded
    pub fn effective_entropy(&self) -> f64 {
        if self.entropy > 0.0 {
            self.entropy
        } else {
            calculate_entropy(self.length, self.charset())
        }
    }

    /// Re-encrypt the password under the session secret for the backend
    pub async fn seal(&self, session: &SessionSecret) -> Result<BackendEntry> {
        let encrypted_password = session.encrypt_value(self.password.expose()).await?;
        let entropy = self.effective_entropy();

        Ok(BackendEntry {
            id: None,
            title: self.title.clone(),
            site: self.site.clone(),
            length: self.length,
            use_uppercase: self.use_uppercase,
            use_lowercase: self.use_lowercase,
            use_digits: self.use_digits,
            use_special: self.use_special,
            entropy,
            entropy_level: Some(EntropyLevel::from_bits(entropy).to_string()),
            expiration_date: self.expiration_date.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            encrypted_password,
        })
    }
}

/// Entry as exchanged with the storage backend
///
/// `encrypted_password` is a per-entry blob under the session's master password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub site: String,
    pub length: u32,
    pub use_uppercase: bool,
    pub use_lowercase: bool,
    pub use_digits: bool,
    pub use_special: bool,
    pub entropy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy_level: Option<String>,
    pub expiration_date: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub encrypted_password: String,
}

impl BackendEntry {
    /// Decrypt the password under the session secret
    pub async fn reveal(&self, session: &SessionSecret) -> Result<PasswordEntry> {
        let password = session.decrypt_value(&self.encrypted_password).await?;

        Ok(PasswordEntry {
            title: self.title.clone(),
            site: self.site.clone(),
            password,
            length: self.length,
            use_uppercase: self.use_uppercase,
            use_lowercase: self.use_lowercase,
            use_digits: self.use_digits,
            use_special: self.use_special,
            entropy: self.entropy,
            expiration_date: self.expiration_date.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        })
    }
}
