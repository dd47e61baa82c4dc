//! Wallet format detection
//!
//! Formats are tried in a fixed order; the first detector whose predicate
//! matches parses the document, and its result is final.

use serde_json::Value;
use tracing::debug;

use super::types::{EncryptionParams, HmacParams};
use crate::entry::PasswordEntry;
use crate::error::{Result, VaultError};

/// Recognized wallet layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFormat {
    /// `data.entries_encrypted` with `meta.encryption`
    EncryptedPayload,
    /// `data.entries` with a top-level `hmac` and `meta.hmac`
    SignedPlaintext,
    /// `data.entries` without any signature
    UnsignedPlaintext,
    /// Top-level `entries` only
    BareEntries,
}

impl WalletFormat {
    /// Formats that carry no cryptographic protection at all
    pub fn is_unprotected(&self) -> bool {
        matches!(self, Self::UnsignedPlaintext | Self::BareEntries)
    }
}

impl std::fmt::Display for WalletFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EncryptedPayload => "encrypted-payload",
            Self::SignedPlaintext => "signed-plaintext",
            Self::UnsignedPlaintext => "unsigned-plaintext",
            Self::BareEntries => "bare-entries",
        };
        f.write_str(name)
    }
}

/// A wallet document classified by its structure, not yet decrypted or verified
#[derive(Debug, Clone)]
pub enum ParsedWallet {
    Encrypted {
        params: EncryptionParams,
        entries_encrypted: String,
    },
    Signed {
        /// `data` exactly as it appears in the file, for canonical serialization
        data: Value,
        signature: String,
        params: HmacParams,
        entries: Vec<PasswordEntry>,
    },
    Unsigned {
        entries: Vec<PasswordEntry>,
    },
    Bare {
        entries: Vec<PasswordEntry>,
    },
}

impl ParsedWallet {
    pub fn format(&self) -> WalletFormat {
        match self {
            Self::Encrypted { .. } => WalletFormat::EncryptedPayload,
            Self::Signed { .. } => WalletFormat::SignedPlaintext,
            Self::Unsigned { .. } => WalletFormat::UnsignedPlaintext,
            Self::Bare { .. } => WalletFormat::BareEntries,
        }
    }
}

struct Detector {
    format: WalletFormat,
    matches: fn(&Value) -> bool,
    parse: fn(&Value) -> Result<ParsedWallet>,
}

/// Evaluated top to bottom; bare entries must stay last
const DETECTORS: [Detector; 4] = [
    Detector {
        format: WalletFormat::EncryptedPayload,
        matches: has_encrypted_payload,
        parse: parse_encrypted,
    },
    Detector {
        format: WalletFormat::SignedPlaintext,
        matches: has_signed_entries,
        parse: parse_signed,
    },
    Detector {
        format: WalletFormat::UnsignedPlaintext,
        matches: has_unsigned_entries,
        parse: parse_unsigned,
    },
    Detector {
        format: WalletFormat::BareEntries,
        matches: has_bare_entries,
        parse: parse_bare,
    },
];

fn has_encrypted_payload(doc: &Value) -> bool {
    doc.pointer("/data/entries_encrypted")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

fn has_data_entries(doc: &Value) -> bool {
    doc.pointer("/data/entries").is_some_and(Value::is_array)
}

fn has_signature(doc: &Value) -> bool {
    doc.get("hmac").is_some_and(|v| !v.is_null())
}

fn has_signed_entries(doc: &Value) -> bool {
    has_data_entries(doc) && has_signature(doc)
}

fn has_unsigned_entries(doc: &Value) -> bool {
    has_data_entries(doc) && !has_signature(doc)
}

fn has_bare_entries(doc: &Value) -> bool {
    doc.get("entries").is_some_and(Value::is_array)
}

fn parse_encrypted(doc: &Value) -> Result<ParsedWallet> {
    let params = doc
        .pointer("/meta/encryption")
        .ok_or_else(|| VaultError::format("missing meta.encryption"))?;
    let params: EncryptionParams = serde_json::from_value(params.clone())
        .map_err(|_| VaultError::format("meta.encryption requires salt and nonce"))?;
    let entries_encrypted = doc
        .pointer("/data/entries_encrypted")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ParsedWallet::Encrypted {
        params,
        entries_encrypted,
    })
}

fn parse_signed(doc: &Value) -> Result<ParsedWallet> {
    let signature = doc
        .get("hmac")
        .and_then(Value::as_str)
        .ok_or_else(|| VaultError::format("hmac must be a base64 string"))?
        .to_string();
    // A signature with no parameters is refused, never downgraded to unsigned
    let params = doc
        .pointer("/meta/hmac")
        .ok_or_else(|| VaultError::format("signed wallet is missing meta.hmac"))?;
    let params: HmacParams = serde_json::from_value(params.clone())
        .map_err(|_| VaultError::format("meta.hmac requires a salt"))?;
    let data = doc
        .get("data")
        .cloned()
        .ok_or_else(|| VaultError::format("missing data"))?;
    let entries = parse_entries(data.get("entries"))?;

    Ok(ParsedWallet::Signed {
        data,
        signature,
        params,
        entries,
    })
}

fn parse_unsigned(doc: &Value) -> Result<ParsedWallet> {
    let entries = parse_entries(doc.pointer("/data/entries"))?;
    Ok(ParsedWallet::Unsigned { entries })
}

fn parse_bare(doc: &Value) -> Result<ParsedWallet> {
    let entries = parse_entries(doc.get("entries"))?;
    Ok(ParsedWallet::Bare { entries })
}

/// Parse an entry list without echoing field values into the error
fn parse_entries(entries: Option<&Value>) -> Result<Vec<PasswordEntry>> {
    let items = entries
        .and_then(Value::as_array)
        .ok_or_else(|| VaultError::format("entries must be an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone())
                .map_err(|_| VaultError::format(format!("entry {} has invalid fields", index)))
        })
        .collect()
}

/// Classify a parsed JSON document
pub fn detect(doc: &Value) -> Result<ParsedWallet> {
    for detector in &DETECTORS {
        if (detector.matches)(doc) {
            debug!(format = %detector.format, "Detected wallet format");
            return (detector.parse)(doc);
        }
    }
    Err(VaultError::format("unrecognized wallet format"))
}

/// Parse raw file bytes and classify them
pub fn detect_bytes(raw: &[u8]) -> Result<ParsedWallet> {
    let doc: Value = serde_json::from_slice(raw)
        .map_err(|e| VaultError::format(format!("wallet is not valid JSON: {}", e)))?;
    detect(&doc)
}
