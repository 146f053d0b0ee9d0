//! Small helpers for email normalization and verification token handling.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new email verification token: 256 random bits, hex-encoded.
///
/// The raw token is only sent to the user; stores keep a hash of it.
pub(crate) fn generate_verification_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate verification token")?;
    Ok(hex::encode(bytes))
}

/// Hash a token so raw values never touch a store.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the frontend verification link included in outbound emails.
pub(crate) fn build_verify_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verify-email#token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn verification_token_is_256_bit_hex() {
        let token = generate_verification_token().expect("generate token");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_token_stable() {
        let first = hash_token("token");
        let second = hash_token("token");
        let different = hash_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn build_verify_url_trims_trailing_slash() {
        let url = build_verify_url("https://pordisto.dev/", "token");
        assert_eq!(url, "https://pordisto.dev/verify-email#token=token");
    }
}
