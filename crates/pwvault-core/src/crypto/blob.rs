//! Per-entry blob framing
//!
//! Binary layout: `salt(16) ‖ nonce(12) ‖ tag(16) ‖ ciphertext(N)`, carried as
//! one standard base64 string across the backend boundary.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::encryption::{NONCE_LEN, TAG_LEN};
use super::key_derivation::SALT_LEN;
use crate::error::{Result, VaultError};

/// Fixed-field prefix every blob carries before the ciphertext
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Encrypted value with everything needed to re-derive its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// KDF salt (16 bytes)
    pub salt: [u8; SALT_LEN],
    /// AES-GCM nonce (12 bytes)
    pub nonce: [u8; NONCE_LEN],
    /// Authentication tag (16 bytes)
    pub tag: [u8; TAG_LEN],
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Serialize into the fixed binary layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the fixed binary layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(VaultError::format(format!(
                "blob too short: expected at least {} bytes, got {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        // Lengths are fixed by the split above
        let mut blob = Self {
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            tag: [0u8; TAG_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        blob.salt.copy_from_slice(salt);
        blob.nonce.copy_from_slice(nonce);
        blob.tag.copy_from_slice(tag);
        Ok(blob)
    }

    /// Encode as a single base64 string
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode from a single base64 string
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| VaultError::format(format!("invalid blob base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl std::str::FromStr for EncryptedBlob {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base64(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedBlob {
        EncryptedBlob {
            salt: [1u8; SALT_LEN],
            nonce: [2u8; NONCE_LEN],
            tag: [3u8; TAG_LEN],
            ciphertext: b"opaque".to_vec(),
        }
    }

    #[test]
    fn test_field_order() {
        let bytes = sample().to_bytes();

        assert_eq!(bytes.len(), HEADER_LEN + 6);
        assert_eq!(&bytes[..16], &[1u8; 16]);
        assert_eq!(&bytes[16..28], &[2u8; 12]);
        assert_eq!(&bytes[28..44], &[3u8; 16]);
        assert_eq!(&bytes[44..], b"opaque");
    }

    #[test]
    fn test_base64_parse() {
        let blob = sample();
        let parsed: EncryptedBlob = blob.to_string().parse().unwrap();
        assert_eq!(parsed, blob);
    }

    #[test]
    fn test_header_only_blob_has_empty_ciphertext() {
        let parsed = EncryptedBlob::from_bytes(&[0u8; HEADER_LEN]).unwrap();
        assert!(parsed.ciphertext.is_empty());
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let short = STANDARD.encode([0u8; HEADER_LEN - 1]);
        assert!(matches!(
            EncryptedBlob::from_base64(&short),
            Err(VaultError::Format(_))
        ));
        assert!(matches!(
            EncryptedBlob::from_base64(""),
            Err(VaultError::Format(_))
        ));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(matches!(
            EncryptedBlob::from_base64("not base64!!"),
            Err(VaultError::Format(_))
        ));
    }
}
