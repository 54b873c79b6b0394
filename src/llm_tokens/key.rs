use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

/// Keyed MAC capability used to sign and verify tokens.
///
/// Signing is modelled as a suspension point so that a host can back the key
/// with an external provider. The in-process [`HmacSha256Key`] completes
/// immediately.
#[async_trait]
pub trait MacKey: Send + Sync {
    /// Full (untruncated) MAC of `payload`.
    async fn sign(&self, payload: &[u8]) -> Vec<u8>;

    /// Constant-time check of `tag` against the leftmost bytes of the MAC of
    /// `payload`. An empty or oversized tag never matches.
    async fn verify_truncated(&self, payload: &[u8], tag: &[u8]) -> bool;
}

/// HMAC-SHA256 key held in memory.
#[derive(Clone)]
pub struct HmacSha256Key {
    bytes: Vec<u8>,
}

pub const MIN_KEY_BYTES: usize = 16;

impl HmacSha256Key {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_KEY_BYTES {
            bail!(
                "HMAC key too short: {} bytes (min {})",
                bytes.len(),
                MIN_KEY_BYTES
            );
        }
        Ok(Self { bytes })
    }

    /// Decodes a standard base64 key, the format printed by `cli-token gen-key`.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .with_context(|| "HMAC key is not valid base64")?;
        Self::new(bytes)
    }

    /// 256 random bits.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    fn mac(&self) -> Hmac<Sha256> {
        // HMAC accepts keys of any length.
        <Hmac<Sha256> as Mac>::new_from_slice(&self.bytes)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"))
    }
}

impl std::fmt::Debug for HmacSha256Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Key")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl MacKey for HmacSha256Key {
    async fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    async fn verify_truncated(&self, payload: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.mac();
        mac.update(payload);
        mac.verify_truncated_left(tag).is_ok()
    }
}
