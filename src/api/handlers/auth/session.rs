//! Session endpoints and refresh-cookie plumbing.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::error_response;
use super::types::LogoutAllResponse;
use crate::auth::{AuthConfig, AuthService};

pub(super) const REFRESH_COOKIE_NAME: &str = "pordisto_refresh";

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session closed and cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    // Best effort: an invalid or missing token still clears the cookie, so
    // logout never fails from the client's point of view.
    if let Some(token) = extract_refresh_token(&headers) {
        if let Err(err) = service.logout(&token).await {
            error!("Failed to close session: {err}");
        }
    }

    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_refresh_cookie(service.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = LogoutAllResponse),
        (status = 401, description = "Unauthenticated", body = String)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout_all(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()).into_response();
    };

    match service.logout_all(&token).await {
        Ok(revoked) => {
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = clear_refresh_cookie(service.config()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (
                StatusCode::OK,
                response_headers,
                Json(LogoutAllResponse { revoked }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}

/// Build the `HttpOnly` refresh cookie for a freshly issued refresh token.
pub(super) fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.refresh_ttl_seconds();
    let secure = config.refresh_cookie_secure();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_refresh_cookie(
    config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.refresh_cookie_secure();
    let mut cookie = format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the refresh token from the session cookie.
pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
