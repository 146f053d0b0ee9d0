//! Credential sign-in endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::error_response;
use super::session::refresh_cookie;
use super::signup::client_ip;
use super::types::{SignInRequest, TokenResponse};
use crate::api::handlers::valid_email;
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Unauthenticated", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(service, payload))]
pub async fn sign_in(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Normalization (trim, lowercase) is owned by the service.
    let email = request.email.trim();
    if !valid_email(email) || request.password.is_empty() {
        // Malformed credentials get the same opaque outcome as wrong ones.
        return (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()).into_response();
    }

    let client_ip = client_ip(&headers);
    match service
        .sign_in(email, &request.password, client_ip.as_deref())
        .await
    {
        Ok(signed_in) => {
            let mut response_headers = HeaderMap::new();
            match refresh_cookie(service.config(), &signed_in.tokens.refresh.token) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build refresh cookie: {err}"),
            }
            let body = TokenResponse {
                access_token: signed_in.tokens.access.token,
                token_type: "Bearer".to_string(),
                expires_in: signed_in.tokens.access.expires_in,
                refresh_token: signed_in.tokens.refresh.token,
            };
            (StatusCode::OK, response_headers, Json(body)).into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_service;
    use super::*;

    #[tokio::test]
    async fn sign_in_missing_payload() {
        let response = sign_in(HeaderMap::new(), Extension(test_service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_in_malformed_email_is_opaque() {
        let response = sign_in(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(SignInRequest {
                email: "not-an-email".to_string(),
                password: "password".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_in_empty_password_is_opaque() {
        let response = sign_in(
            HeaderMap::new(),
            Extension(test_service()),
            Some(Json(SignInRequest {
                email: "alice@example.com".to_string(),
                password: String::new(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
