//! Cache Key Module
//!
//! Maps caller keys onto file-name-safe stems. Lowercase ASCII letters, digits,
//! `-` and `_` pass through; every other byte, uppercase letters included,
//! becomes `%XX` with uppercase hex. The mapping stays injective even when stems
//! are compared case-insensitively, so distinct keys never share a file on
//! case-folding filesystems either. The output never contains a path separator
//! or a `.` that could form `..`.

use crate::error::{CacheError, Result};

/// Longest stem allowed, leaving room for the `.cache` extension under the
/// common 255-byte file name limit.
pub const MAX_STORAGE_KEY_LENGTH: usize = 240;

// == Sanitize ==
/// Returns the storage stem for `key`.
pub fn sanitize(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: String::new(),
            reason: "key cannot be empty".to_string(),
        });
    }

    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if passes_through(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }

    if out.len() > MAX_STORAGE_KEY_LENGTH {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
            reason: format!(
                "encoded key exceeds maximum length of {} bytes",
                MAX_STORAGE_KEY_LENGTH
            ),
        });
    }

    Ok(out)
}

/// Reverses [`sanitize`]; `None` when `stem` was not produced by it.
pub fn restore(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = stem.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if passes_through(b) => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

fn passes_through(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' || byte == b'_'
}
