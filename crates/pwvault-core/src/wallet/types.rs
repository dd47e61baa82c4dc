//! Wallet file type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{DEFAULT_ITERATIONS, TAG_LEN};
use crate::entry::PasswordEntry;
use crate::error::{Result, VaultError};

/// Version of the outer wallet file layout
pub const WALLET_FORMAT_VERSION: &str = "1.0";

pub const ALGORITHM_AES_GCM: &str = "AES-GCM";
pub const KDF_PBKDF2: &str = "PBKDF2";
pub const KDF_HASH_SHA256: &str = "SHA-256";

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_tag_bytes() -> usize {
    TAG_LEN
}

fn default_algorithm() -> String {
    ALGORITHM_AES_GCM.to_string()
}

fn default_kdf() -> String {
    KDF_PBKDF2.to_string()
}

fn default_kdf_hash() -> String {
    KDF_HASH_SHA256.to_string()
}

/// Application that produced the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

/// Everything needed to reverse the payload encryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionParams {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_kdf")]
    pub kdf: String,
    #[serde(default = "default_kdf_hash")]
    pub kdf_hash: String,
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,
    /// Base64 KDF salt
    pub salt: String,
    /// Base64 AES-GCM nonce
    pub nonce: String,
    #[serde(default = "default_tag_bytes")]
    pub tag_bytes: usize,
}

impl EncryptionParams {
    /// Reject algorithm choices this crate cannot reproduce
    pub fn validate(&self) -> Result<()> {
        if self.algorithm != ALGORITHM_AES_GCM {
            return Err(VaultError::format(format!(
                "unsupported algorithm: {}",
                self.algorithm
            )));
        }
        if self.kdf != KDF_PBKDF2 {
            return Err(VaultError::format(format!("unsupported kdf: {}", self.kdf)));
        }
        if self.kdf_hash != KDF_HASH_SHA256 {
            return Err(VaultError::format(format!(
                "unsupported kdf hash: {}",
                self.kdf_hash
            )));
        }
        if self.tag_bytes != TAG_LEN {
            return Err(VaultError::format(format!(
                "unsupported tag size: {} bytes",
                self.tag_bytes
            )));
        }
        if self.kdf_iterations == 0 {
            return Err(VaultError::format("kdf_iterations must be at least 1"));
        }
        Ok(())
    }
}

/// Key derivation parameters of a legacy signed wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmacParams {
    /// Base64 KDF salt
    pub salt: String,
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationParams {
    pub format: String,
    pub encoding: String,
    pub indent: u8,
}

impl Default for SerializationParams {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            encoding: "utf-8".to_string(),
            indent: 2,
        }
    }
}

/// Self-describing wallet metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMeta {
    pub wallet_format_version: String,
    pub app: AppInfo,
    pub exported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionParams>,
    #[serde(default)]
    pub serialization: SerializationParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<HmacParams>,
}

impl WalletMeta {
    pub fn new(app: AppInfo) -> Self {
        Self {
            wallet_format_version: WALLET_FORMAT_VERSION.to_string(),
            app,
            exported_at: Utc::now(),
            encryption: None,
            serialization: SerializationParams::default(),
            hmac: None,
        }
    }
}

/// Wallet body: either an encrypted payload or a plaintext entry list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WalletData {
    Encrypted {
        /// Base64 of `ciphertext ‖ tag`
        entries_encrypted: String,
    },
    Plain {
        entries: Vec<PasswordEntry>,
    },
}

/// Wallet file as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletFile {
    pub meta: WalletMeta,
    pub data: WalletData,
    /// Base64 HMAC over `data` (legacy signed format only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,
}

impl WalletFile {
    /// Pretty JSON with two-space indentation
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Inner document that gets encrypted into `entries_encrypted`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletPayload {
    pub version: String,
    pub entries: Vec<PasswordEntry>,
}
