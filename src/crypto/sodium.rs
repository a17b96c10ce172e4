//! XSalsa20-Poly1305 secret-box backend, wire-compatible with libsodium's
//! `crypto_secretbox_easy` when the nonce is prepended.

use crypto_secretbox::aead::KeyInit;
use crypto_secretbox::XSalsa20Poly1305;

use super::{open, seal, CryptoError};
use crate::error::{CacheError, Result};

/// Secret-box key length in bytes
pub const SODIUM_KEY_LEN: usize = 32;

/// Secret-box nonce length in bytes
pub const SODIUM_NONCE_LEN: usize = 24;

// == Sodium Crypto ==
pub struct SodiumCrypto {
    cipher: XSalsa20Poly1305,
}

impl SodiumCrypto {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != SODIUM_KEY_LEN {
            return Err(CacheError::Configuration(format!(
                "secret-box requires a {}-byte key, got {} bytes",
                SODIUM_KEY_LEN,
                key.len()
            )));
        }
        let cipher = XSalsa20Poly1305::new_from_slice(key)
            .map_err(|_| CacheError::Configuration("secret-box rejected the key".to_string()))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        seal(&self.cipher, plaintext)
    }

    pub fn decrypt(&self, framed: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        open(&self.cipher, framed)
    }
}
