//! Wallet import/export orchestration
//!
//! Drives the prompt, key derivation, cipher and wallet codec. Every
//! derive-then-cipher unit runs on the blocking pool so the caller's event
//! loop stays responsive; nothing is written anywhere by this module.

use tracing::{info, warn};

use crate::crypto::SecretString;
use crate::entry::{BackendEntry, PasswordEntry};
use crate::error::{Result, VaultError};
use crate::prompt::{SecretPrompt, SecretPurpose};
use crate::session::SessionSecret;
use crate::settings::Settings;
use crate::wallet::{
    detect_bytes, open_payload, seal_payload, verify_data, ParsedWallet, WalletFile,
    WalletFormat, WalletPayload,
};

/// Entries recovered from a wallet file
#[derive(Debug, Clone)]
pub struct ImportedWallet {
    /// Layout the file was recognized as
    pub format: WalletFormat,
    pub entries: Vec<PasswordEntry>,
}

/// Export/import orchestrator with an injected secret prompt
///
/// One wallet operation at a time per session; callers serialize access.
pub struct WalletTransfer<P: SecretPrompt> {
    prompt: P,
    settings: Settings,
}

impl<P: SecretPrompt> WalletTransfer<P> {
    pub fn new(prompt: P, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { prompt, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    async fn ask(
        &self,
        purpose: SecretPurpose,
        requires_confirmation: bool,
    ) -> Result<SecretString> {
        match self.prompt.ask_secret(purpose, requires_confirmation).await {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => {
                info!(?purpose, "Secret prompt dismissed, aborting");
                Err(VaultError::Cancelled)
            }
        }
    }

    /// Encrypt already-decrypted entries into a new wallet file
    pub async fn export(&self, entries: Vec<PasswordEntry>) -> Result<WalletFile> {
        let password = self.ask(SecretPurpose::ExportWallet, true).await?;

        let payload = WalletPayload {
            version: self.settings.payload_version.clone(),
            entries,
        };
        let count = payload.entries.len();
        let iterations = self.settings.kdf_iterations;
        let app = self.settings.app();

        let file = tokio::task::spawn_blocking(move || {
            seal_payload(&payload, password.expose(), iterations, app)
        })
        .await??;

        info!(entries = count, iterations, "Exported wallet");
        Ok(file)
    }

    /// Detect the wallet format and recover its plaintext entries
    pub async fn import(&self, raw: &[u8]) -> Result<ImportedWallet> {
        let parsed = detect_bytes(raw)?;
        let format = parsed.format();

        if format.is_unprotected() && !self.settings.allow_unsigned_import {
            warn!(%format, "Rejected wallet without signature or encryption");
            return Err(VaultError::UnsignedRejected);
        }

        let entries = match parsed {
            ParsedWallet::Encrypted {
                params,
                entries_encrypted,
            } => {
                let password = self.ask(SecretPurpose::ImportWallet, false).await?;
                let payload = tokio::task::spawn_blocking(move || {
                    open_payload(&params, &entries_encrypted, password.expose())
                })
                .await??;
                payload.entries
            }
            ParsedWallet::Signed {
                data,
                signature,
                params,
                entries,
            } => {
                let password = self.ask(SecretPurpose::VerifySignature, false).await?;
                tokio::task::spawn_blocking(move || {
                    verify_data(&data, &signature, password.expose(), &params)
                })
                .await??;
                entries
            }
            ParsedWallet::Unsigned { entries } => {
                warn!("Importing legacy wallet without a signature");
                entries
            }
            ParsedWallet::Bare { entries } => entries,
        };

        info!(%format, entries = entries.len(), "Imported wallet");
        Ok(ImportedWallet { format, entries })
    }

    /// Decrypt backend records under the session, then export them
    ///
    /// A record that fails to decrypt aborts the whole export.
    pub async fn export_backend(
        &self,
        session: &SessionSecret,
        records: &[BackendEntry],
    ) -> Result<WalletFile> {
        ensure_active(session).await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(record.reveal(session).await?);
        }
        self.export(entries).await
    }

    /// Import a wallet and re-encrypt every entry under the session for the backend
    pub async fn import_backend(
        &self,
        session: &SessionSecret,
        raw: &[u8],
    ) -> Result<Vec<BackendEntry>> {
        ensure_active(session).await?;

        let imported = self.import(raw).await?;
        let mut records = Vec::with_capacity(imported.entries.len());
        for entry in &imported.entries {
            records.push(entry.seal(session).await?);
        }
        Ok(records)
    }
}

async fn ensure_active(session: &SessionSecret) -> Result<()> {
    if session.is_active().await {
        Ok(())
    } else {
        Err(VaultError::contract("no active session"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{sign_wallet, WalletData};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use std::sync::Mutex;

    const FAST: u32 = 1_000;

    /// Prompt that always answers the same way and records what it was asked
    struct FixedPrompt {
        answer: Option<String>,
        calls: Mutex<Vec<(SecretPurpose, bool)>>,
    }

    impl FixedPrompt {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn dismissed() -> Self {
            Self {
                answer: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(SecretPurpose, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SecretPrompt for FixedPrompt {
        async fn ask_secret(
            &self,
            purpose: SecretPurpose,
            requires_confirmation: bool,
        ) -> Option<SecretString> {
            self.calls
                .lock()
                .unwrap()
                .push((purpose, requires_confirmation));
            self.answer.as_deref().map(SecretString::from)
        }
    }

    fn settings() -> Settings {
        Settings {
            kdf_iterations: FAST,
            entry_kdf_iterations: FAST,
            ..Settings::default()
        }
    }

    fn transfer(prompt: FixedPrompt) -> WalletTransfer<FixedPrompt> {
        WalletTransfer::new(prompt, settings()).unwrap()
    }

    fn entries() -> Vec<PasswordEntry> {
        vec![
            PasswordEntry {
                title: "Mail".to_string(),
                site: "mail.example.com".to_string(),
                password: SecretString::from("Secret123!"),
                length: 10,
                use_uppercase: true,
                use_lowercase: true,
                use_digits: true,
                use_special: true,
                entropy: 64.59,
                expiration_date: Some("2025-01-01T00:00:00".to_string()),
                created_at: Some("2024-05-01T10:00:00".to_string()),
                updated_at: Some("2024-05-02T10:00:00".to_string()),
            },
            PasswordEntry::new("Forum", "forum.example.org", "s\u{e9}nha \u{1f512}"),
            PasswordEntry::new("Empty", "", ""),
        ]
    }

    async fn exported_json(password: &str) -> String {
        let exporter = transfer(FixedPrompt::answering(password));
        exporter.export(entries()).await.unwrap().to_json().unwrap()
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let exporter = transfer(FixedPrompt::answering("wallet-pass"));
        let file = exporter.export(entries()).await.unwrap();
        assert_eq!(
            exporter.prompt().calls(),
            vec![(SecretPurpose::ExportWallet, true)]
        );

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        let imported = importer
            .import(file.to_json().unwrap().as_bytes())
            .await
            .unwrap();

        assert_eq!(imported.format, WalletFormat::EncryptedPayload);
        assert_eq!(imported.entries, entries());
        assert_eq!(
            importer.prompt().calls(),
            vec![(SecretPurpose::ImportWallet, false)]
        );
    }

    #[tokio::test]
    async fn test_exported_file_is_self_describing() {
        let json: serde_json::Value =
            serde_json::from_str(&exported_json("wallet-pass").await).unwrap();

        let encryption = &json["meta"]["encryption"];
        assert_eq!(encryption["algorithm"], "AES-GCM");
        assert_eq!(encryption["kdf"], "PBKDF2");
        assert_eq!(encryption["kdf_hash"], "SHA-256");
        assert_eq!(encryption["kdf_iterations"], FAST);
        assert_eq!(encryption["tag_bytes"], 16);
        assert_eq!(json["meta"]["serialization"]["format"], "json");
        assert_eq!(json["meta"]["app"]["name"], "password-managment");
        assert!(json["meta"]["exported_at"].is_string());
        assert!(json["data"]["entries_encrypted"].is_string());

        let text = json.to_string();
        assert!(!text.contains("Secret123!"));
        assert!(!text.contains("mail.example.com"));
    }

    #[tokio::test]
    async fn test_export_cancelled() {
        let exporter = transfer(FixedPrompt::dismissed());
        assert!(matches!(
            exporter.export(entries()).await,
            Err(VaultError::Cancelled)
        ));

        let exporter = transfer(FixedPrompt::answering(""));
        assert!(matches!(
            exporter.export(entries()).await,
            Err(VaultError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_import_wrong_password() {
        let json = exported_json("wallet-pass").await;
        let importer = transfer(FixedPrompt::answering("guess"));

        let err = importer.import(json.as_bytes()).await.unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailure));
        assert!(err.is_wrong_secret());
    }

    #[tokio::test]
    async fn test_import_tampered_payload() {
        let mut json: serde_json::Value =
            serde_json::from_str(&exported_json("wallet-pass").await).unwrap();
        let mut sealed = STANDARD
            .decode(json["data"]["entries_encrypted"].as_str().unwrap())
            .unwrap();
        sealed[3] ^= 0x01;
        json["data"]["entries_encrypted"] = STANDARD.encode(sealed).into();

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        assert!(matches!(
            importer.import(json.to_string().as_bytes()).await,
            Err(VaultError::AuthenticationFailure)
        ));
    }

    #[tokio::test]
    async fn test_import_cancelled() {
        let json = exported_json("wallet-pass").await;
        let importer = transfer(FixedPrompt::dismissed());

        assert!(matches!(
            importer.import(json.as_bytes()).await,
            Err(VaultError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_signed_legacy_wallet() {
        let file = sign_wallet(entries(), settings().app(), "wallet-pass", FAST).unwrap();
        let json = file.to_json().unwrap();

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        let imported = importer.import(json.as_bytes()).await.unwrap();

        assert_eq!(imported.format, WalletFormat::SignedPlaintext);
        assert_eq!(imported.entries, entries());
        assert_eq!(
            importer.prompt().calls(),
            vec![(SecretPurpose::VerifySignature, false)]
        );
    }

    #[tokio::test]
    async fn test_signed_legacy_wallet_tampered() {
        let file = sign_wallet(entries(), settings().app(), "wallet-pass", FAST).unwrap();
        let json = file.to_json().unwrap();
        let tampered = json.replacen("\"title\": \"Mail\"", "\"title\": \"Maik\"", 1);
        assert_ne!(json, tampered);

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        assert!(matches!(
            importer.import(tampered.as_bytes()).await,
            Err(VaultError::IntegrityFailure)
        ));
    }

    #[tokio::test]
    async fn test_signed_legacy_wallet_wrong_password() {
        let file = sign_wallet(entries(), settings().app(), "wallet-pass", FAST).unwrap();
        let json = file.to_json().unwrap();

        let importer = transfer(FixedPrompt::answering("other"));
        assert!(matches!(
            importer.import(json.as_bytes()).await,
            Err(VaultError::IntegrityFailure)
        ));
    }

    #[tokio::test]
    async fn test_signed_wallet_without_hmac_params_is_refused() {
        let file = sign_wallet(entries(), settings().app(), "wallet-pass", FAST).unwrap();
        let mut json = serde_json::to_value(&file).unwrap();
        json["meta"].as_object_mut().unwrap().remove("hmac");

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        assert!(matches!(
            importer.import(json.to_string().as_bytes()).await,
            Err(VaultError::Format(_))
        ));
        assert!(importer.prompt().calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsigned_legacy_wallet() {
        let json = r#"{"meta": {}, "data": {"entries": [{"title": "a", "site": "b", "password": "p"}]}}"#;

        let importer = transfer(FixedPrompt::dismissed());
        let imported = importer.import(json.as_bytes()).await.unwrap();

        assert_eq!(imported.format, WalletFormat::UnsignedPlaintext);
        assert_eq!(imported.entries.len(), 1);
        assert!(importer.prompt().calls().is_empty());
    }

    #[tokio::test]
    async fn test_bare_entries() {
        let json = r#"{"entries":[{"title":"a","site":"b","password":"p"}]}"#;

        let importer = transfer(FixedPrompt::dismissed());
        let imported = importer.import(json.as_bytes()).await.unwrap();

        assert_eq!(imported.format, WalletFormat::BareEntries);
        assert_eq!(imported.entries, vec![PasswordEntry::new("a", "b", "p")]);
    }

    #[tokio::test]
    async fn test_unprotected_rejected_by_policy() {
        let strict = Settings {
            allow_unsigned_import: false,
            ..settings()
        };
        let importer = WalletTransfer::new(FixedPrompt::answering("wallet-pass"), strict).unwrap();

        for json in [
            r#"{"entries":[]}"#,
            r#"{"data": {"entries": []}}"#,
        ] {
            assert!(matches!(
                importer.import(json.as_bytes()).await,
                Err(VaultError::UnsignedRejected)
            ));
        }

        // Signed wallets are still accepted
        let file = sign_wallet(vec![], settings().app(), "wallet-pass", FAST).unwrap();
        let imported = importer
            .import(file.to_json().unwrap().as_bytes())
            .await
            .unwrap();
        assert!(imported.entries.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_format() {
        let importer = transfer(FixedPrompt::answering("wallet-pass"));

        assert!(matches!(
            importer.import(br#"{"salt": "x", "data": "y"}"#).await,
            Err(VaultError::Format(_))
        ));
        assert!(matches!(
            importer.import(b"not json").await,
            Err(VaultError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_roundtrip() {
        let session = SessionSecret::with_iterations(FAST);
        session.begin(SecretString::from("master")).await.unwrap();

        let mut records = Vec::new();
        for entry in entries() {
            records.push(entry.seal(&session).await.unwrap());
        }

        let exporter = transfer(FixedPrompt::answering("wallet-pass"));
        let file = exporter.export_backend(&session, &records).await.unwrap();
        assert!(matches!(file.data, WalletData::Encrypted { .. }));

        let importer = transfer(FixedPrompt::answering("wallet-pass"));
        let imported = importer
            .import_backend(&session, file.to_json().unwrap().as_bytes())
            .await
            .unwrap();

        assert_eq!(imported.len(), records.len());
        for (record, original) in imported.iter().zip(entries()) {
            assert_eq!(record.id, None);
            assert!(record.entropy_level.is_some());
            assert_ne!(record.encrypted_password, "");
            assert_eq!(
                record.reveal(&session).await.unwrap().password,
                original.password
            );
        }
    }

    #[tokio::test]
    async fn test_backend_export_aborts_on_bad_record() {
        let session = SessionSecret::with_iterations(FAST);
        session.begin(SecretString::from("master")).await.unwrap();

        let mut records = vec![entries()[0].seal(&session).await.unwrap()];
        records.push(BackendEntry {
            encrypted_password: "garbage".to_string(),
            ..records[0].clone()
        });

        let exporter = transfer(FixedPrompt::answering("wallet-pass"));
        assert!(exporter.export_backend(&session, &records).await.is_err());
        assert!(exporter.prompt().calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_requires_session() {
        let session = SessionSecret::with_iterations(FAST);
        let importer = transfer(FixedPrompt::answering("wallet-pass"));

        assert!(matches!(
            importer.import_backend(&session, br#"{"entries":[]}"#).await,
            Err(VaultError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let bad = Settings {
            kdf_iterations: 0,
            ..Settings::default()
        };
        assert!(matches!(
            WalletTransfer::new(FixedPrompt::dismissed(), bad),
            Err(VaultError::ContractViolation(_))
        ));
    }
}
