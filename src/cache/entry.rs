//! Cache Entry Module
//!
//! The persisted envelope for one key: write time, TTL and framed ciphertext.
//! On disk it is JSON with the ciphertext base64-encoded:
//!
//! ```text
//! {"timestamp":1700000000,"ttl":60,"data":"<base64 nonce ‖ ciphertext>"}
//! ```
//!
//! `timestamp`, `ttl` and the storage key are also sealed inside the
//! ciphertext as a header in front of the payload:
//!
//! ```text
//! timestamp (i64 BE) ‖ ttl (u64 BE) ‖ key length (u64 BE) ‖ key ‖ payload
//! ```
//!
//! After decryption the header must match the envelope, so editing the clear
//! fields or renaming the file is detected like any other tampering.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// == Envelope Error ==
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Not JSON, or missing fields
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// `data` is not base64, so the ciphertext itself is malformed
    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

// == Cache Entry ==
/// One stored entry. `key` is not persisted in clear; the file name carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Storage key this entry was loaded from
    #[serde(skip)]
    pub key: String,
    /// Write time (unix seconds)
    pub timestamp: i64,
    /// Lifetime in seconds from `timestamp`
    pub ttl: u64,
    /// Nonce-framed ciphertext
    #[serde(serialize_with = "encode_base64")]
    pub data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    timestamp: i64,
    ttl: u64,
    data: String,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(key: impl Into<String>, timestamp: i64, ttl: u64, data: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            timestamp,
            ttl,
            data,
        }
    }

    // == Expires At ==
    /// Last second at which the entry is still valid.
    pub fn expires_at(&self) -> i64 {
        self.timestamp
            .saturating_add(i64::try_from(self.ttl).unwrap_or(i64::MAX))
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is still valid at exactly
    /// `timestamp + ttl` and expired one second later.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at()
    }

    // == Time To Live ==
    /// Remaining lifetime in seconds at `now`, 0 once expired.
    pub fn ttl_remaining(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at().saturating_sub(now)).unwrap_or(0)
    }

    // == Sealed Header ==
    /// Header sealed ahead of the payload for this entry's fields.
    pub fn header(&self) -> Vec<u8> {
        let key = self.key.as_bytes();
        let mut header = Vec::with_capacity(24 + key.len());
        header.extend_from_slice(&self.timestamp.to_be_bytes());
        header.extend_from_slice(&self.ttl.to_be_bytes());
        header.extend_from_slice(&(key.len() as u64).to_be_bytes());
        header.extend_from_slice(key);
        header
    }

    /// Plaintext to encrypt: header followed by `payload`.
    pub fn bind_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut plaintext = self.header();
        plaintext.extend_from_slice(payload);
        plaintext
    }

    /// Strips the header from decrypted `plaintext`.
    ///
    /// `None` when the sealed header disagrees with this envelope.
    pub fn verify_payload<'a>(&self, plaintext: &'a [u8]) -> Option<&'a [u8]> {
        plaintext.strip_prefix(self.header().as_slice())
    }

    // == Encoding ==
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_slice(bytes)?;
        Ok(Self {
            key: key.into(),
            timestamp: raw.timestamp,
            ttl: raw.ttl,
            data: BASE64_STANDARD.decode(raw.data)?,
        })
    }
}

fn encode_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
}
