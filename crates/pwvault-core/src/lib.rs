//! # pwvault-core
//!
//! Client-side cryptographic core of the password manager:
//! - PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM envelope encryption
//! - Per-entry `salt ‖ nonce ‖ tag ‖ ciphertext` blobs
//! - Password-protected wallet files, including legacy signed formats
//! - Import/export orchestration behind an injected secret prompt
//!
//! Pure transform: no network I/O and nothing is persisted.

pub mod crypto;
pub mod entry;
pub mod error;
pub mod prompt;
pub mod session;
pub mod settings;
mod transfer;
pub mod wallet;

pub use crypto::{decrypt, encrypt, DerivedKey, EncryptedBlob, SecretString};
pub use entry::{BackendEntry, EntropyLevel, PasswordEntry};
pub use error::{Result, VaultError};
pub use prompt::{SecretPrompt, SecretPurpose};
pub use session::SessionSecret;
pub use settings::Settings;
pub use transfer::{ImportedWallet, WalletTransfer};
pub use wallet::{WalletFile, WalletFormat};
