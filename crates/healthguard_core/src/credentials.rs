//! Salted password hashing.
//!
//! Stored form: `<salt>$<digest>`, where `salt` is 32 lowercase hex
//! characters (16 random bytes) and `digest` is the lowercase hex SHA-256 of
//! the salt text immediately followed by the password.
//!
//! This is the format user records already carry, so it has to stay
//! byte-compatible with existing hashes.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Write;

const SALT_BYTES: usize = 16;
const SEPARATOR: char = '$';

/// Hashes `password` with a fresh random salt.
///
/// Two calls with the same password produce different results.
///
/// # Example
///
/// ```rust
/// use healthguard_core::{hash_password, verify_password};
///
/// let stored = hash_password("admin123");
/// assert!(verify_password("admin123", &stored));
/// assert!(!verify_password("admin124", &stored));
/// ```
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = to_hex(&salt);
    let digest = salted_digest(&salt, password);
    format!("{salt}{SEPARATOR}{digest}")
}

/// Checks `password` against a stored `salt$digest` value.
///
/// Malformed stored values never match and never panic.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let expected = salted_digest(salt, password);
    constant_time_eq(expected.as_bytes(), digest.as_bytes())
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
