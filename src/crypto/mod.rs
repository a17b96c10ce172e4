//! Crypto Module
//!
//! Symmetric encryption backends for cache payloads. Both backends frame their
//! output as `nonce ‖ sealed bytes` so a payload carries everything needed to
//! open it except the key.
//!
//! - `openssl`: AES-GCM, cipher chosen by name (`aes-256-gcm` etc.)
//! - `sodium`: XSalsa20-Poly1305 secret-box with a 24-byte nonce

mod openssl;
mod sodium;

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::EncryptionSettings;
use crate::error::{CacheError, Result};

pub use openssl::{CipherKind, OpenSslCrypto};
pub use sodium::{SodiumCrypto, SODIUM_KEY_LEN, SODIUM_NONCE_LEN};

/// Poly1305 and GCM both append a 16-byte tag
pub const TAG_LEN: usize = 16;

// == Crypto Error ==
/// Failure inside a cipher call. The engine attaches the cache key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("cipher failed to seal payload")]
    Seal,

    #[error("payload is {actual} bytes, shorter than the {minimum}-byte minimum")]
    Truncated { actual: usize, minimum: usize },

    #[error("authentication tag mismatch")]
    TagMismatch,
}

// == Encryption Type ==
/// Backend selected by `ENCRYPTION.TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionType {
    OpenSsl,
    Sodium,
}

impl FromStr for EncryptionType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openssl" => Ok(EncryptionType::OpenSsl),
            "sodium" => Ok(EncryptionType::Sodium),
            other => Err(CacheError::Configuration(format!(
                "unsupported encryption type '{}'",
                other
            ))),
        }
    }
}

// == Crypto Provider ==
/// Encryption strategy resolved once from configuration.
pub enum CryptoProvider {
    OpenSsl(OpenSslCrypto),
    Sodium(SodiumCrypto),
}

impl fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoProvider::OpenSsl(c) => f.debug_tuple("OpenSsl").field(&c.kind()).finish(),
            CryptoProvider::Sodium(_) => f.write_str("Sodium"),
        }
    }
}

impl CryptoProvider {
    /// Builds the provider named by `settings.kind`, decoding its key.
    ///
    /// Every configuration problem surfaces here rather than on first use.
    pub fn from_settings(settings: &EncryptionSettings) -> Result<Self> {
        let provider = match settings.kind.parse::<EncryptionType>()? {
            EncryptionType::OpenSsl => {
                let kind = settings.cipher.parse::<CipherKind>()?;
                let key = decode_key("ENCRYPTION.KEY", settings.key.as_deref())?;
                CryptoProvider::OpenSsl(OpenSslCrypto::new(kind, &key)?)
            }
            EncryptionType::Sodium => {
                let key = decode_key("ENCRYPTION.SODIUM", settings.sodium_key.as_deref())?;
                CryptoProvider::Sodium(SodiumCrypto::new(&key)?)
            }
        };
        debug!(provider = ?provider, "crypto provider initialised");
        Ok(provider)
    }

    /// Which backend this is.
    pub fn encryption_type(&self) -> EncryptionType {
        match self {
            CryptoProvider::OpenSsl(_) => EncryptionType::OpenSsl,
            CryptoProvider::Sodium(_) => EncryptionType::Sodium,
        }
    }

    /// Length of the random prefix on every payload.
    pub fn nonce_len(&self) -> usize {
        match self {
            CryptoProvider::OpenSsl(c) => c.kind().iv_len(),
            CryptoProvider::Sodium(_) => SODIUM_NONCE_LEN,
        }
    }

    /// Encrypts under a fresh random nonce and returns `nonce ‖ ciphertext+tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        match self {
            CryptoProvider::OpenSsl(c) => c.encrypt(plaintext),
            CryptoProvider::Sodium(c) => c.encrypt(plaintext),
        }
    }

    /// Splits off the nonce and opens the remainder.
    pub fn decrypt(&self, framed: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        match self {
            CryptoProvider::OpenSsl(c) => c.decrypt(framed),
            CryptoProvider::Sodium(c) => c.decrypt(framed),
        }
    }
}

fn decode_key(name: &str, encoded: Option<&str>) -> Result<Zeroizing<Vec<u8>>> {
    let encoded = encoded
        .ok_or_else(|| CacheError::Configuration(format!("{} is not set", name)))?;
    BASE64_STANDARD
        .decode(encoded.trim())
        .map(Zeroizing::new)
        .map_err(|e| CacheError::Configuration(format!("{} is not valid base64: {}", name, e)))
}

// == Framing ==
/// Seals `plaintext` under a random nonce and prepends the nonce.
pub(crate) fn seal<C>(cipher: &C, plaintext: &[u8]) -> std::result::Result<Vec<u8>, CryptoError>
where
    C: Aead + AeadCore,
{
    let mut nonce = Nonce::<C>::default();
    OsRng.fill_bytes(nonce.as_mut_slice());

    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Seal)?;

    let mut framed = Vec::with_capacity(nonce.len() + sealed.len());
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&sealed);
    Ok(framed)
}

/// Inverse of [`seal`]; rejects input too short to hold a nonce and tag.
pub(crate) fn open<C>(cipher: &C, framed: &[u8]) -> std::result::Result<Vec<u8>, CryptoError>
where
    C: Aead + AeadCore,
{
    let nonce_len = C::NonceSize::USIZE;
    let minimum = nonce_len + C::TagSize::USIZE;
    if framed.len() < minimum {
        return Err(CryptoError::Truncated {
            actual: framed.len(),
            minimum,
        });
    }

    let (nonce, sealed) = framed.split_at(nonce_len);
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::TagMismatch)
}
