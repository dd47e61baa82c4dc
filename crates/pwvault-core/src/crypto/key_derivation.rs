//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::DerivedKey;
use crate::error::{Result, VaultError};

/// Iteration count used when a caller does not specify one
pub const DEFAULT_ITERATIONS: u32 = 300_000;

/// Salt length for newly generated salts
pub const SALT_LEN: usize = 16;

/// HMAC-SHA256 keys are derived at the hash block size (64 bytes)
pub const MAC_KEY_LEN: usize = 64;

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn check_inputs(password: &str, salt: &[u8], iterations: u32) -> Result<()> {
    if password.is_empty() {
        return Err(VaultError::contract("password must not be empty"));
    }
    if salt.is_empty() {
        return Err(VaultError::contract("salt must not be empty"));
    }
    if iterations == 0 {
        return Err(VaultError::contract("iterations must be at least 1"));
    }
    Ok(())
}

/// Derive a 256-bit AES key from a password
///
/// # Arguments
/// * `password` - The user's password
/// * `salt` - Salt bytes (16 bytes for everything this crate generates)
/// * `iterations` - PBKDF2 round count, must be reproduced exactly to decrypt
///
/// Deterministic: identical inputs always yield the same key.
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Result<DerivedKey> {
    check_inputs(password, salt, iterations)?;

    let mut key = DerivedKey::zeroed();
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.as_mut_bytes());
    Ok(key)
}

/// Derive an HMAC-SHA256 key for the legacy signed wallet format
pub fn derive_mac_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<Zeroizing<[u8; MAC_KEY_LEN]>> {
    check_inputs(password, salt, iterations)?;

    let mut key = Zeroizing::new([0u8; MAC_KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.as_mut());
    Ok(key)
}
