//! HMAC-SHA256 signatures for the legacy plaintext wallet format
//!
//! The signed message is `data` pretty-printed with two-space indentation in
//! the key order it has in the file, with numbers written the way JavaScript
//! prints them (`40.0` is written as `40`).

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;
use sha2::Sha256;
use std::io;
use tracing::debug;

use super::codec::decode_field;
use super::types::{AppInfo, HmacParams, WalletData, WalletFile, WalletMeta};
use crate::crypto::{derive_mac_key, generate_salt};
use crate::entry::PasswordEntry;
use crate::error::{Result, VaultError};

type HmacSha256 = Hmac<Sha256>;

/// Largest magnitude JavaScript still prints without an exponent
const JS_EXPONENT_THRESHOLD: f64 = 1e21;

/// Two-space pretty printer that writes floats in JavaScript number form
struct JsFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl JsFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for JsFormatter<'_> {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if value == 0.0 {
            return writer.write_all(b"0");
        }
        if value.fract() == 0.0 && value.abs() < JS_EXPONENT_THRESHOLD {
            return write!(writer, "{:.0}", value);
        }
        self.pretty.write_f64(writer, value)
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.write_f64(writer, f64::from(value))
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object_value(writer)
    }
}

fn to_js_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, JsFormatter::new());
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|_| VaultError::format("canonical data is not UTF-8"))
}

/// Canonical serialization of a wallet's `data` object
pub fn canonical_data(data: &Value) -> Result<String> {
    to_js_pretty(data)
}

fn mac_for(data: &Value, password: &str, salt: &[u8], iterations: u32) -> Result<HmacSha256> {
    let key = derive_mac_key(password, salt, iterations)?;
    let mut mac = HmacSha256::new_from_slice(&key[..])
        .map_err(|_| VaultError::contract("invalid HMAC key length"))?;
    mac.update(canonical_data(data)?.as_bytes());
    Ok(mac)
}

/// Compute the base64 signature over `data`
pub fn sign_data(data: &Value, password: &str, salt: &[u8], iterations: u32) -> Result<String> {
    let mac = mac_for(data, password, salt, iterations)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a signature in constant time
///
/// Mismatch (wrong password or modified data) is `IntegrityFailure`.
pub fn verify_data(
    data: &Value,
    signature: &str,
    password: &str,
    params: &HmacParams,
) -> Result<()> {
    let salt = decode_field("meta.hmac.salt", &params.salt)?;
    let expected = decode_field("hmac", signature)?;

    mac_for(data, password, &salt, params.kdf_iterations)?
        .verify_slice(&expected)
        .map_err(|_| VaultError::IntegrityFailure)?;

    debug!("Wallet signature verified");
    Ok(())
}

/// Build a signed plaintext wallet
pub fn sign_wallet(
    entries: Vec<PasswordEntry>,
    app: AppInfo,
    password: &str,
    iterations: u32,
) -> Result<WalletFile> {
    let salt = generate_salt();
    let data = WalletData::Plain { entries };
    let signature = sign_data(&serde_json::to_value(&data)?, password, &salt, iterations)?;

    let mut meta = WalletMeta::new(app);
    meta.hmac = Some(HmacParams {
        salt: STANDARD.encode(salt),
        kdf_iterations: iterations,
    });

    Ok(WalletFile {
        meta,
        data,
        hmac: Some(signature),
    })
}
