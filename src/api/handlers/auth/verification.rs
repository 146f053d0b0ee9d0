//! Email verification endpoints.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::error_response;
use super::signup::client_ip;
use super::types::{ResendVerificationRequest, VerifyEmailParams};
use crate::api::handlers::valid_email;
use crate::auth::{AuthError, AuthService, RateLimitAction, RateLimitDecision};

/// Consume the emailed verification link's token and activate the account.
#[utoipa::path(
    get,
    path = "/v1/auth/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 204, description = "Email verified"),
        (status = 400, description = "Invalid or expired token", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    params: Option<Query<VerifyEmailParams>>,
) -> impl IntoResponse {
    let token = params
        .map(|Query(params)| params.token.trim().to_string())
        .unwrap_or_default();
    if token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response();
    }

    let client_ip = client_ip(&headers);
    // Rate limits are enforced before any token work to avoid amplification.
    if service
        .limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::VerifyEmail)
        == RateLimitDecision::Limited
    {
        return error_response(&AuthError::RateLimited).into_response();
    }

    match service.verify_email(&token).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::BAD_REQUEST, "Invalid token".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Resend a verification email (always returns 204 to avoid user enumeration).
#[utoipa::path(
    post,
    path = "/v1/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 204, description = "Resend accepted")
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Normalization (trim, lowercase) is owned by the service.
    let email = request.email.trim();
    if !valid_email(email) {
        // Always return 204 for invalid emails to avoid account probing.
        return StatusCode::NO_CONTENT.into_response();
    }

    let client_ip = client_ip(&headers);
    match service.resend_verification(email, client_ip.as_deref()).await {
        // Resend is intentionally opaque; rate limits and store failures
        // still return 204.
        Ok(()) | Err(AuthError::RateLimited) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to resend verification: {err}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_service;
    use super::*;

    #[tokio::test]
    async fn verify_email_missing_token() {
        let response = verify_email(HeaderMap::new(), Extension(test_service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_email_blank_token() {
        let response = verify_email(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Query(VerifyEmailParams {
                token: " ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_email_unknown_token() {
        let response = verify_email(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Query(VerifyEmailParams {
                token: "deadbeef".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_verification_missing_payload() {
        let response = resend_verification(HeaderMap::new(), Extension(test_service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_verification_invalid_email_is_opaque() {
        let response = resend_verification(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(ResendVerificationRequest {
                email: "not-an-email".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
