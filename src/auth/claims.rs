//! Token codec: signing and verification of access and refresh tokens.

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::error::AuthError;
use super::users::UserRole;

/// Discriminator claim so a refresh token is never accepted where an access
/// token is expected, and vice versa.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed claim set carried by both token kinds.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Token id; for refresh tokens this is the key tracked by the registry.
    pub jti: Uuid,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token plus the metadata callers need to track it.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
    pub expires_in: i64,
}

/// HS256 codec over a process-wide symmetric secret, loaded once at startup.
/// Key rotation is out of scope.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Sign a new token of the given kind with its configured TTL.
    ///
    /// # Errors
    /// Returns [`AuthError::Store`] if signing fails.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        };
        self.issue_with_ttl(kind, user_id, email, role, ttl)
    }

    /// Sign a token with an explicit TTL in seconds (negative TTLs produce
    /// already-expired tokens, which is useful in tests).
    ///
    /// # Errors
    /// Returns [`AuthError::Store`] if signing fails.
    pub fn issue_with_ttl(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        email: &str,
        role: UserRole,
        ttl_seconds: i64,
    ) -> Result<IssuedToken, AuthError> {
        let now = unix_now();
        let token_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            jti: token_id,
            kind,
            iat: now,
            exp: now + ttl_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Store(anyhow::Error::new(err).context("sign token")))?;

        Ok(IssuedToken {
            token,
            token_id,
            expires_in: ttl_seconds,
        })
    }

    /// Verify signature, expiry, and the `typ` discriminator.
    ///
    /// # Errors
    /// Returns the matching [`AuthError`] token variant on any failure.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: an expired token is expired, full stop.
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
                _ => AuthError::TokenMalformed,
            }
        })?;

        if data.claims.kind != expected {
            return Err(AuthError::TokenTypeMismatch);
        }

        Ok(data.claims)
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }
}

fn unix_now() -> i64 {
    // Clamp instead of failing: a pre-epoch clock is not worth an error path.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("test-signing-secret"), 900, 604_800)
    }

    #[test]
    fn issue_and_verify_access_token() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let issued = codec
            .issue(TokenKind::Access, user_id, "alice@example.com", UserRole::User)
            .expect("issue access token");

        assert_eq!(issued.expires_in, 900);

        let claims = codec
            .verify(&issued.token, TokenKind::Access)
            .expect("verify access token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.jti, issued.token_id);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let codec = codec();
        let issued = codec
            .issue(
                TokenKind::Refresh,
                Uuid::new_v4(),
                "alice@example.com",
                UserRole::User,
            )
            .expect("issue refresh token");

        let err = codec.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenTypeMismatch));
    }

    #[test]
    fn access_token_rejected_as_refresh() {
        let codec = codec();
        let issued = codec
            .issue(
                TokenKind::Access,
                Uuid::new_v4(),
                "alice@example.com",
                UserRole::User,
            )
            .expect("issue access token");

        let err = codec.verify(&issued.token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, AuthError::TokenTypeMismatch));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let issued = codec
            .issue_with_ttl(
                TokenKind::Access,
                Uuid::new_v4(),
                "alice@example.com",
                UserRole::User,
                -30,
            )
            .expect("issue expired token");

        let err = codec.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let codec = codec();
        let other = TokenCodec::new(&SecretString::from("other-secret"), 900, 604_800);
        let issued = other
            .issue(
                TokenKind::Access,
                Uuid::new_v4(),
                "alice@example.com",
                UserRole::User,
            )
            .expect("issue token");

        let err = codec.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        let err = codec.verify("not-a-token", TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenMalformed));
    }
}
