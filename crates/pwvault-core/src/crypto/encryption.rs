//! AES-256-GCM envelope encryption
//!
//! Every call to [`encrypt`] draws a fresh salt and nonce, derives a key with
//! PBKDF2 and returns an [`EncryptedBlob`] that carries the tag as its own field.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use super::blob::EncryptedBlob;
use super::key_derivation::{derive_key, generate_salt, DEFAULT_ITERATIONS};
use super::{DerivedKey, SecretString};
use crate::error::{Result, VaultError};

/// Nonce length (96 bits, standard for GCM)
pub const NONCE_LEN: usize = 12;

/// Authentication tag length (128 bits)
pub const TAG_LEN: usize = 16;

/// Generate a random nonce
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn cipher_for(key: &DerivedKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::contract("AES-256 key must be 32 bytes"))
}

/// Encrypt `plaintext` under an already derived key
///
/// Returns the ciphertext (same length as the plaintext) and the detached tag.
pub fn seal(
    plaintext: &[u8],
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = cipher_for(key)?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer)
        .map_err(|_| VaultError::contract("plaintext too large for AES-GCM"))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);
    Ok((buffer, tag_bytes))
}

/// Decrypt and authenticate under an already derived key
///
/// Fails with [`VaultError::AuthenticationFailure`] on any tag mismatch; no
/// plaintext is produced in that case.
pub fn open(ciphertext: &[u8], tag: &[u8], key: &DerivedKey, nonce: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::format(format!(
            "invalid nonce length: expected {}, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }
    if tag.len() != TAG_LEN {
        return Err(VaultError::format(format!(
            "invalid tag length: expected {}, got {}",
            TAG_LEN,
            tag.len()
        )));
    }

    let cipher = cipher_for(key)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| VaultError::AuthenticationFailure)?;

    Ok(buffer)
}

/// Encrypt with the default iteration count
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<EncryptedBlob> {
    encrypt_with_iterations(plaintext, password, DEFAULT_ITERATIONS)
}

/// Encrypt with a fresh salt and nonce under a key derived from `password`
pub fn encrypt_with_iterations(
    plaintext: &[u8],
    password: &str,
    iterations: u32,
) -> Result<EncryptedBlob> {
    let salt = generate_salt();
    let nonce = generate_nonce();

    let key = derive_key(password, &salt, iterations)?;
    let (ciphertext, tag) = seal(plaintext, &key, &nonce)?;

    debug!(len = ciphertext.len(), iterations, "Encrypted blob");

    Ok(EncryptedBlob {
        salt,
        nonce,
        tag,
        ciphertext,
    })
}

/// Decrypt with the default iteration count
pub fn decrypt(blob: &EncryptedBlob, password: &str) -> Result<Vec<u8>> {
    decrypt_with_iterations(blob, password, DEFAULT_ITERATIONS)
}

/// Re-derive the key from the blob's own salt and decrypt
pub fn decrypt_with_iterations(
    blob: &EncryptedBlob,
    password: &str,
    iterations: u32,
) -> Result<Vec<u8>> {
    let key = derive_key(password, &blob.salt, iterations)?;
    open(&blob.ciphertext, &blob.tag, &key, &blob.nonce)
}

/// Encrypt a string and return the base64 blob
pub fn encrypt_string(plaintext: &str, password: &str, iterations: u32) -> Result<String> {
    let blob = encrypt_with_iterations(plaintext.as_bytes(), password, iterations)?;
    Ok(blob.to_base64())
}

/// Decrypt a base64 blob into a UTF-8 secret
pub fn decrypt_string(encoded: &str, password: &str, iterations: u32) -> Result<SecretString> {
    let blob = EncryptedBlob::from_base64(encoded)?;
    let plaintext = Zeroizing::new(decrypt_with_iterations(&blob, password, iterations)?);
    let text = std::str::from_utf8(&plaintext)
        .map_err(|e| VaultError::format(format!("decrypted value is not UTF-8: {}", e)))?;
    Ok(SecretString::new(text.to_string()))
}
