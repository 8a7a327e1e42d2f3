//! Opaque token generation for signing sessions and download links.
//!
//! Tokens are raw CSPRNG bytes, hex-encoded, and carry no structure: the
//! only way to use one is to present it verbatim. Collision resistance at
//! 32 bytes makes uniqueness a non-concern for callers; the storage layer
//! still enforces a uniqueness constraint on the token column as defense
//! in depth.

#![deny(unsafe_code)]

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Token payload size in bytes. Hex-encoding doubles this on the wire.
pub const TOKEN_BYTES: usize = 32;

/// Default signing-link lifetime. Organizations may configure 1..=30.
pub const SIGNING_TOKEN_EXPIRY_DAYS: u32 = 7;

/// Download-link lifetime after completion. Deliberately longer than the
/// signing window: a finished document is less sensitive than a pending
/// signing obligation.
pub const DOWNLOAD_TOKEN_EXPIRY_DAYS: u32 = 90;

/// Generate an unguessable token of `TOKEN_BYTES` random bytes,
/// hex-encoded (64 characters).
pub fn generate_token() -> String {
    generate_token_bytes(TOKEN_BYTES)
}

/// Generate a token of `byte_length` random bytes, hex-encoded.
///
/// The operating system CSPRNG is the only failure mode; `OsRng` treats
/// that as fatal, which is the desired behavior for a credential mint.
pub fn generate_token_bytes(byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length];
    OsRng.fill_bytes(&mut bytes);
    encode_hex(&bytes)
}

/// Expiry timestamp `days` from now.
pub fn token_expiry(days: u32) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(i64::from(days) * 86_400)
}

fn encode_hex(bytes: &[u8]) -> String {
    const TABLE: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(TABLE[(b >> 4) as usize] as char);
        out.push(TABLE[(b & 0x0f) as usize] as char);
    }
    out
}
