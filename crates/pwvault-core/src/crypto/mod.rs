//! Cryptographic primitives for per-entry secrets and wallet payloads
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from passwords
//! - AES-256-GCM envelope encryption with detached tags
//! - The `salt ‖ nonce ‖ tag ‖ ciphertext` blob codec
//! - Secure memory handling with zeroize

mod blob;
mod encryption;
mod key_derivation;
mod secure_memory;

pub use blob::{EncryptedBlob, HEADER_LEN};
pub use encryption::{
    decrypt, decrypt_string, decrypt_with_iterations, encrypt, encrypt_string,
    encrypt_with_iterations, generate_nonce, open, seal, NONCE_LEN, TAG_LEN,
};
pub use key_derivation::{
    derive_key, derive_mac_key, generate_salt, DEFAULT_ITERATIONS, MAC_KEY_LEN, SALT_LEN,
};
pub use secure_memory::{DerivedKey, SecretString, KEY_LEN};
