//! pwvault - terminal host for the password manager's crypto core
//!
//! Encrypts and decrypts individual values under a master password and moves
//! password-protected wallet files in and out. All file I/O happens here; the
//! core only transforms bytes.

mod prompt;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use pwvault_core::{PasswordEntry, SessionSecret, Settings, VaultError, WalletTransfer};

use crate::prompt::TerminalPrompt;

/// Password wallet tool - per-entry encryption and wallet import/export
#[derive(Parser, Debug)]
#[command(name = "pwvault")]
#[command(version)]
#[command(about = "Encrypt secrets and export/import password-protected wallet files")]
struct Args {
    /// Settings file (JSON)
    #[arg(long, env = "PWVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// PBKDF2 iterations for newly exported wallets
    #[arg(long, env = "PWVAULT_KDF_ITERATIONS")]
    iterations: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a value under the master password and print the blob
    Encrypt,

    /// Decrypt a blob produced by `encrypt`
    Decrypt {
        /// Base64 blob
        blob: String,
    },

    /// Encrypt a JSON list of entries into a wallet file
    Export {
        /// JSON array of entries
        #[arg(long)]
        input: PathBuf,

        /// Wallet file to write
        #[arg(long)]
        output: PathBuf,
    },

    /// Recover the entries of a wallet file
    Import {
        /// Wallet file to read
        #[arg(long)]
        input: PathBuf,

        /// Write entries here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Refuse wallets without a signature or encryption
        #[arg(long)]
        reject_unsigned: bool,
    },
}

fn resolve_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(iterations) = args.iterations {
        settings.kdf_iterations = iterations;
    }
    if let Command::Import {
        reject_unsigned: true,
        ..
    } = args.command
    {
        settings.allow_unsigned_import = false;
    }

    settings.validate()?;
    Ok(settings)
}

async fn start_session(settings: &Settings) -> anyhow::Result<SessionSecret> {
    let password = TerminalPrompt::ask("Master password", false)
        .await
        .ok_or(VaultError::Cancelled)?;

    let session = SessionSecret::with_iterations(settings.entry_kdf_iterations);
    session.begin(password).await?;
    Ok(session)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = resolve_settings(&args)?;

    match args.command {
        Command::Encrypt => {
            let session = start_session(&settings).await?;
            let value = TerminalPrompt::ask("Value to encrypt", true)
                .await
                .ok_or(VaultError::Cancelled)?;

            println!("{}", session.encrypt_value(value.expose()).await?);
            session.clear().await;
        }
        Command::Decrypt { blob } => {
            let session = start_session(&settings).await?;
            let value = session.decrypt_value(&blob).await?;

            println!("{}", value.expose());
            session.clear().await;
        }
        Command::Export { input, output } => {
            let contents = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {:?}", input))?;
            let entries: Vec<PasswordEntry> = serde_json::from_str(&contents)
                .with_context(|| format!("{:?} is not a JSON array of entries", input))?;

            let transfer = WalletTransfer::new(TerminalPrompt, settings)?;
            let wallet = transfer.export(entries).await?;

            tokio::fs::write(&output, wallet.to_json()?)
                .await
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!("Wallet written to {:?}", output);
        }
        Command::Import { input, output, .. } => {
            let raw = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {:?}", input))?;

            let transfer = WalletTransfer::new(TerminalPrompt, settings)?;
            let imported = transfer.import(&raw).await?;
            let json = serde_json::to_string_pretty(&imported.entries)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    info!(
                        format = %imported.format,
                        "Wrote {} entries to {:?}",
                        imported.entries.len(),
                        path
                    );
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for blobs and JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run(args).await {
        Err(e) if matches!(e.downcast_ref::<VaultError>(), Some(VaultError::Cancelled)) => {
            eprintln!("Cancelled, nothing was written.");
            Ok(())
        }
        result => result,
    }
}
