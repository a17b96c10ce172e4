//! AES-GCM backend addressed by OpenSSL cipher names.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::KeyInit;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};

use super::{open, seal, CryptoError};
use crate::error::{CacheError, Result};

type Aes192Gcm = AesGcm<Aes192, U12>;

// == Cipher Kind ==
/// Authenticated ciphers accepted in `ENCRYPTION.CIPHER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    Aes128Gcm,
    Aes192Gcm,
    Aes256Gcm,
}

impl CipherKind {
    /// OpenSSL name of the cipher.
    pub fn name(&self) -> &'static str {
        match self {
            CipherKind::Aes128Gcm => "aes-128-gcm",
            CipherKind::Aes192Gcm => "aes-192-gcm",
            CipherKind::Aes256Gcm => "aes-256-gcm",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            CipherKind::Aes128Gcm => 16,
            CipherKind::Aes192Gcm => 24,
            CipherKind::Aes256Gcm => 32,
        }
    }

    /// IV length in bytes.
    pub fn iv_len(&self) -> usize {
        12
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-128-gcm" => Ok(CipherKind::Aes128Gcm),
            "aes-192-gcm" => Ok(CipherKind::Aes192Gcm),
            "aes-256-gcm" => Ok(CipherKind::Aes256Gcm),
            other => Err(CacheError::Configuration(format!(
                "unsupported cipher '{}' (expected aes-128-gcm, aes-192-gcm or aes-256-gcm)",
                other
            ))),
        }
    }
}

enum AesCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

// == OpenSSL Crypto ==
/// AES-GCM keyed once at construction.
pub struct OpenSslCrypto {
    kind: CipherKind,
    cipher: AesCipher,
}

impl OpenSslCrypto {
    /// Keys the cipher; the key must match the cipher's key length exactly.
    pub fn new(kind: CipherKind, key: &[u8]) -> Result<Self> {
        if key.len() != kind.key_len() {
            return Err(CacheError::Configuration(format!(
                "{} requires a {}-byte key, got {} bytes",
                kind,
                kind.key_len(),
                key.len()
            )));
        }

        let invalid = |_| CacheError::Configuration(format!("{} rejected the key", kind));
        let cipher = match kind {
            CipherKind::Aes128Gcm => {
                AesCipher::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?)
            }
            CipherKind::Aes192Gcm => {
                AesCipher::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?)
            }
            CipherKind::Aes256Gcm => {
                AesCipher::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?)
            }
        };

        Ok(Self { kind, cipher })
    }

    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        match &self.cipher {
            AesCipher::Aes128(c) => seal(c, plaintext),
            AesCipher::Aes192(c) => seal(c, plaintext),
            AesCipher::Aes256(c) => seal(c, plaintext),
        }
    }

    pub fn decrypt(&self, framed: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        match &self.cipher {
            AesCipher::Aes128(c) => open(c, framed),
            AesCipher::Aes192(c) => open(c, framed),
            AesCipher::Aes256(c) => open(c, framed),
        }
    }
}
