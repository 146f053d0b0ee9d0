//! Undocumented `/` route; returns the service identity string.

use axum::response::IntoResponse;

pub async fn root() -> impl IntoResponse {
    crate::APP_USER_AGENT
}
