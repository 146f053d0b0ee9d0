//! # Pordisto (Authentication Token Lifecycle Service)
//!
//! `pordisto` issues and manages the full lifecycle of authentication tokens:
//! short-lived access tokens, refresh tokens tracked in a per-user session
//! registry, and single-use email verification tokens.
//!
//! ## Tokens
//!
//! - **Access tokens** are stateless 15-minute JWTs; validity derives solely
//!   from the signature and expiry.
//! - **Refresh tokens** are 7-day JWTs whose ids are tracked per user. Each
//!   user holds at most a configured number of concurrent sessions (default
//!   5); registering one more evicts the oldest-inserted session. Refresh
//!   rotates the token, so a replayed refresh token is rejected.
//! - Both kinds carry a `typ` discriminator; a refresh token is never accepted
//!   where an access token is expected, and vice versa.
//!
//! ## Email verification
//!
//! Sign-up stages a 256-bit single-use token with a 24-hour TTL. Only a hash
//! of the token is stored; the raw value lives solely in the emailed link.
//!
//! ## Abuse protection
//!
//! Sign-up, sign-in, refresh, and verification endpoints are rate limited per
//! client IP and per email with configurable presets (`default`, `strict`,
//! `rigid`). Authentication failures are reported with a single opaque 401 so
//! unknown-email and wrong-password are indistinguishable to callers.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
