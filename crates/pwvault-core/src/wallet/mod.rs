//! Portable wallet files
//!
//! Supports the encrypted-payload format for export and import, plus the
//! legacy signed/unsigned plaintext and bare `{entries}` formats for import.

mod codec;
mod format;
mod signature;
mod types;

pub use codec::{open_payload, seal_payload};
pub use format::{detect, detect_bytes, ParsedWallet, WalletFormat};
pub use signature::{canonical_data, sign_data, sign_wallet, verify_data};
pub use types::{
    AppInfo, EncryptionParams, HmacParams, SerializationParams, WalletData, WalletFile,
    WalletMeta, WalletPayload, ALGORITHM_AES_GCM, KDF_HASH_SHA256, KDF_PBKDF2,
    WALLET_FORMAT_VERSION,
};
