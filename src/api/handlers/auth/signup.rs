//! Account registration endpoint.

use axum::{extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::instrument;

use super::error_response;
use super::types::{SignUpRequest, SignUpResponse};
use crate::api::handlers::{valid_email, valid_password};
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Invalid email or password", body = String),
        (status = 409, description = "Email is already registered", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(service, payload))]
pub async fn sign_up(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SignUpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Normalization (trim, lowercase) is owned by the service.
    let email = request.email.trim();
    if !valid_email(email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let client_ip = client_ip(&headers);
    match service
        .sign_up(
            email,
            &request.password,
            request.name.as_deref(),
            client_ip.as_deref(),
        )
        .await
    {
        Ok(signed_up) => (
            StatusCode::CREATED,
            Json(SignUpResponse {
                user_id: signed_up.user_id.to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Client address for rate limiting, taken from common proxy headers.
pub(super) fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_service;
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn sign_up_missing_payload() {
        let response = sign_up(HeaderMap::new(), Extension(test_service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_up_invalid_email() {
        let response = sign_up(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(SignUpRequest {
                email: "not-an-email".to_string(),
                password: "long enough".to_string(),
                name: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_up_short_password() {
        let response = sign_up(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(SignUpRequest {
                email: "alice@example.com".to_string(),
                password: "short".to_string(),
                name: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_up_mixed_case_email_passes_validation() {
        // Validation must not depend on handler-side lowercasing; the request
        // reaches the service and only fails at the unreachable store.
        let response = sign_up(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(SignUpRequest {
                email: " Alice@Example.COM ".to_string(),
                password: "long enough".to_string(),
                name: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), Some("9.9.9.9".to_string()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
