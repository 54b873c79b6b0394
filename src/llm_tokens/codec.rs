use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{LlmTokenError, LlmTokenRuntime};

pub const TOKEN_VERSION: u8 = 1;
pub const PAYLOAD_BYTES: usize = 8;
/// 80-bit truncated HMAC-SHA256.
pub const HMAC_BYTES: usize = 10;
pub const TOKEN_BYTES: usize = PAYLOAD_BYTES + HMAC_BYTES;
pub const TOKEN_CHARS: usize = 24;

const MAX_U24: u32 = 0x00FF_FFFF;

/// Decoded, signature-checked token.
///
/// `expired` is computed at verification time; a token that verifies is not
/// necessarily usable, see [`verify_active_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenData {
    pub version: u8,
    pub expiry_hours: u32,
    pub group_bits: u8,
    pub entry_bits: u32,
    pub expired: bool,
}

impl TokenData {
    /// Whole hours of validity left at `now`, never negative.
    pub fn remaining_hours(&self, rt: &LlmTokenRuntime, now: DateTime<Utc>) -> i64 {
        (self.expiry_hours as i64 - rt.hours_since_epoch(now)).max(0)
    }
}

/// Why a presented token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Undecodable, wrong length or version, or bad signature.
    Invalid,
    /// Correctly signed but past its expiry hour.
    Expired,
}

fn encode_u24(value: u32) -> [u8; 3] {
    let [_, hi, mid, lo] = (value & MAX_U24).to_be_bytes();
    [hi, mid, lo]
}

fn decode_u24(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

fn build_payload(expiry_hours: u32, group_bits: u8, entry_bits: u32) -> [u8; PAYLOAD_BYTES] {
    let mut payload = [0u8; PAYLOAD_BYTES];
    payload[0] = TOKEN_VERSION;
    payload[1..4].copy_from_slice(&encode_u24(expiry_hours));
    payload[4] = group_bits;
    payload[5..8].copy_from_slice(&encode_u24(entry_bits));
    payload
}

async fn truncated_mac(rt: &LlmTokenRuntime, payload: &[u8]) -> Vec<u8> {
    let mut digest = rt.key().sign(payload).await;
    digest.truncate(HMAC_BYTES);
    digest
}

pub async fn create_token(
    rt: &LlmTokenRuntime,
    group_bits: u8,
    entry_bits: u32,
) -> Result<String, LlmTokenError> {
    create_token_at(rt, group_bits, entry_bits, Utc::now()).await
}

/// Mints a token valid for `rt.expires_in_hours()` hours from `now`.
///
/// Bits of `entry_bits` above the 24th are dropped by the encoding.
pub async fn create_token_at(
    rt: &LlmTokenRuntime,
    group_bits: u8,
    entry_bits: u32,
    now: DateTime<Utc>,
) -> Result<String, LlmTokenError> {
    let expiry_hours = rt.hours_since_epoch(now) + rt.expires_in_hours() as i64;
    if !(0..=MAX_U24 as i64).contains(&expiry_hours) {
        return Err(LlmTokenError::ExpiryOutOfRange(expiry_hours));
    }

    let payload = build_payload(expiry_hours as u32, group_bits, entry_bits);
    let mac = truncated_mac(rt, &payload).await;

    let mut token = Vec::with_capacity(TOKEN_BYTES);
    token.extend_from_slice(&payload);
    token.extend_from_slice(&mac);

    Ok(URL_SAFE_NO_PAD.encode(token))
}

pub async fn verify_token(rt: &LlmTokenRuntime, token: &str) -> Option<TokenData> {
    verify_token_at(rt, token, Utc::now()).await
}

/// Checks the signature and decodes the payload. `None` means the token is
/// malformed or was not issued with this key. Expiry is reported, not enforced.
pub async fn verify_token_at(
    rt: &LlmTokenRuntime,
    token: &str,
    now: DateTime<Utc>,
) -> Option<TokenData> {
    let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
    if bytes.len() != TOKEN_BYTES || bytes[0] != TOKEN_VERSION {
        return None;
    }

    let (payload, provided_mac) = bytes.split_at(PAYLOAD_BYTES);
    if !rt.key().verify_truncated(payload, provided_mac).await {
        return None;
    }

    let expiry_hours = decode_u24(&payload[1..4]);
    let group_bits = payload[4];
    let entry_bits = decode_u24(&payload[5..8]);
    let expired = rt.hours_since_epoch(now) > expiry_hours as i64;

    Some(TokenData {
        version: TOKEN_VERSION,
        expiry_hours,
        group_bits,
        entry_bits,
        expired,
    })
}

pub async fn verify_active_token(
    rt: &LlmTokenRuntime,
    token: &str,
) -> Result<TokenData, TokenRejection> {
    verify_active_token_at(rt, token, Utc::now()).await
}

/// Like [`verify_token_at`] but refuses expired tokens.
pub async fn verify_active_token_at(
    rt: &LlmTokenRuntime,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenData, TokenRejection> {
    match verify_token_at(rt, token, now).await {
        None => Err(TokenRejection::Invalid),
        Some(data) if data.expired => Err(TokenRejection::Expired),
        Some(data) => Ok(data),
    }
}
