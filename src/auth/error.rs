//! Error taxonomy for the authentication core.

use thiserror::Error;

/// Failures surfaced by the auth service and its collaborators.
///
/// Authentication failures are collapsed into a single opaque outcome at the
/// HTTP boundary (see [`AuthError::is_unauthenticated`]); the concrete kind is
/// only logged server-side so callers cannot distinguish unknown-email from
/// wrong-password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("token signature is invalid")]
    TokenInvalidSignature,

    #[error("token is malformed")]
    TokenMalformed,

    #[error("token type mismatch")]
    TokenTypeMismatch,

    /// Registry miss: the refresh token was revoked, evicted, or never existed.
    #[error("session not found")]
    SessionNotFound,

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("rate limited")]
    RateLimited,

    /// Transient store/signing failure. Kept distinct from authentication
    /// failures so clients do not mistake infrastructure outages for bad
    /// credentials.
    #[error("store unavailable")]
    Store(#[source] anyhow::Error),
}

impl AuthError {
    /// Whether this failure should be reported as an opaque "unauthenticated"
    /// outcome.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::TokenExpired
                | Self::TokenInvalidSignature
                | Self::TokenMalformed
                | Self::TokenTypeMismatch
                | Self::SessionNotFound
        )
    }
}
