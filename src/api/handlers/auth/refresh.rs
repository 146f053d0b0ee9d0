//! Silent refresh endpoint: exchanges a refresh token for a rotated pair.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::error_response;
use super::session::{extract_refresh_token, refresh_cookie};
use super::signup::client_ip;
use super::types::{RefreshRequest, TokenResponse};
use crate::auth::AuthService;

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = TokenResponse),
        (status = 401, description = "Unauthenticated", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(service, payload))]
pub async fn refresh(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    // Body token wins over the cookie so non-browser clients can rotate
    // explicitly; browsers rely on the HttpOnly cookie alone.
    let body_token = payload.and_then(|Json(request)| request.refresh_token);
    let Some(token) = body_token.or_else(|| extract_refresh_token(&headers)) else {
        return (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()).into_response();
    };

    let client_ip = client_ip(&headers);
    match service.refresh(&token, client_ip.as_deref()).await {
        Ok(refreshed) => {
            let mut response_headers = HeaderMap::new();
            match refresh_cookie(service.config(), &refreshed.tokens.refresh.token) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build refresh cookie: {err}"),
            }
            let body = TokenResponse {
                access_token: refreshed.tokens.access.token,
                token_type: "Bearer".to_string(),
                expires_in: refreshed.tokens.access.expires_in,
                refresh_token: refreshed.tokens.refresh.token,
            };
            (StatusCode::OK, response_headers, Json(body)).into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
