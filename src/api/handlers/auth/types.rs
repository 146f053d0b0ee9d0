//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignUpResponse {
    pub user_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Issued token pair. The refresh token is also set as an `HttpOnly` cookie
/// for browser clients; non-browser clients read it from the body.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    /// Optional when the refresh cookie is present.
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

#[derive(IntoParams, Deserialize, Debug)]
pub struct VerifyEmailParams {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn sign_up_request_round_trips() -> Result<()> {
        let request = SignUpRequest {
            email: "alice@example.com".to_string(),
            password: "correct horse".to_string(),
            name: None,
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: SignUpRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "correct horse");
        assert!(decoded.name.is_none());
        Ok(())
    }

    #[test]
    fn refresh_request_token_is_optional() -> Result<()> {
        let decoded: RefreshRequest = serde_json::from_str("{}")?;
        assert!(decoded.refresh_token.is_none());
        let decoded: RefreshRequest = serde_json::from_str(r#"{"refresh_token":"abc"}"#)?;
        assert_eq!(decoded.refresh_token.as_deref(), Some("abc"));
        Ok(())
    }

    #[test]
    fn token_response_round_trips() -> Result<()> {
        let response = TokenResponse {
            access_token: "jwt".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 900,
            refresh_token: "jwt2".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        let decoded: TokenResponse = serde_json::from_value(value)?;
        assert_eq!(decoded.token_type, "Bearer");
        assert_eq!(decoded.expires_in, 900);
        Ok(())
    }
}
