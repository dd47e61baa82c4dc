//! Encrypted-payload wallet codec
//!
//! The payload `{version, entries}` is pretty-printed, encrypted with a key
//! derived from the wallet password, and stored as base64 of
//! `ciphertext ‖ tag`. Salt, nonce and iteration count go into
//! `meta.encryption` so the file can be inspected and reversed.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;
use zeroize::Zeroizing;

use super::types::{
    AppInfo, EncryptionParams, WalletData, WalletFile, WalletMeta, WalletPayload,
    ALGORITHM_AES_GCM, KDF_HASH_SHA256, KDF_PBKDF2,
};
use crate::crypto::{derive_key, generate_nonce, generate_salt, open, seal, TAG_LEN};
use crate::error::{Result, VaultError};

pub(crate) fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| VaultError::format(format!("invalid base64 in {}: {}", field, e)))
}

/// Encrypt a payload into a complete wallet file
pub fn seal_payload(
    payload: &WalletPayload,
    password: &str,
    iterations: u32,
    app: AppInfo,
) -> Result<WalletFile> {
    let plaintext = Zeroizing::new(serde_json::to_string_pretty(payload)?);

    let salt = generate_salt();
    let nonce = generate_nonce();
    let key = derive_key(password, &salt, iterations)?;
    let (mut ciphertext, tag) = seal(plaintext.as_bytes(), &key, &nonce)?;
    ciphertext.extend_from_slice(&tag);

    debug!(
        entries = payload.entries.len(),
        iterations, "Sealed wallet payload"
    );

    let mut meta = WalletMeta::new(app);
    meta.encryption = Some(EncryptionParams {
        algorithm: ALGORITHM_AES_GCM.to_string(),
        kdf: KDF_PBKDF2.to_string(),
        kdf_hash: KDF_HASH_SHA256.to_string(),
        kdf_iterations: iterations,
        salt: STANDARD.encode(salt),
        nonce: STANDARD.encode(nonce),
        tag_bytes: TAG_LEN,
    });

    Ok(WalletFile {
        meta,
        data: WalletData::Encrypted {
            entries_encrypted: STANDARD.encode(ciphertext),
        },
        hmac: None,
    })
}

/// Decrypt and parse an encrypted payload
///
/// A wrong password or tampered bytes give `AuthenticationFailure`; a payload
/// that decrypts but is not a `{version, entries}` document gives `Format`.
pub fn open_payload(
    params: &EncryptionParams,
    entries_encrypted: &str,
    password: &str,
) -> Result<WalletPayload> {
    params.validate()?;

    let salt = decode_field("meta.encryption.salt", &params.salt)?;
    let nonce = decode_field("meta.encryption.nonce", &params.nonce)?;
    let sealed = decode_field("data.entries_encrypted", entries_encrypted)?;

    if salt.is_empty() {
        return Err(VaultError::format("meta.encryption.salt is empty"));
    }
    if sealed.len() < params.tag_bytes {
        return Err(VaultError::format(format!(
            "data.entries_encrypted too short: {} bytes",
            sealed.len()
        )));
    }

    let (ciphertext, tag) = sealed.split_at(sealed.len() - params.tag_bytes);
    let key = derive_key(password, &salt, params.kdf_iterations)?;
    let plaintext = Zeroizing::new(open(ciphertext, tag, &key, &nonce)?);

    let payload: WalletPayload = serde_json::from_slice(&plaintext)
        .map_err(|_| VaultError::format("decrypted payload is not a valid wallet document"))?;

    debug!(entries = payload.entries.len(), "Opened wallet payload");
    Ok(payload)
}
