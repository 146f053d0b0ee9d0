//! Argon2 password hashing.

use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a password with a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails (effectively only on RNG failure).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Constant-time verification against a stored PHC-format hash.
///
/// Unparseable hashes verify as false rather than erroring; a corrupt stored
/// hash must read as "wrong password", not as a server fault callers can probe.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
