//! Credential commands.

use healthguard_core::{hash_password, verify_password};

/// Prints a freshly salted hash of `password`.
pub fn hash(password: &str) {
    println!("{}", hash_password(password));
}

/// Checks `password` against `stored`; a mismatch is an error so the exit
/// status reflects the outcome.
pub fn verify(password: &str, stored: &str) -> Result<(), Box<dyn std::error::Error>> {
    if verify_password(password, stored) {
        println!("✓ Password matches");
        Ok(())
    } else {
        Err("password does not match".into())
    }
}
