use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::Settings;

/// Middleware to check for Authorization header
///
/// When `GATEWAY_AUTHORIZATION` was configured, the request must carry an
/// `Authorization` header with exactly that value. Otherwise the check is skipped.
pub async fn auth_middleware(
    State(settings): State<Arc<Settings>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if let Some(secret) = settings.authorization.as_deref() {
        let presented = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        let accepted = presented
            .is_some_and(|value| constant_time_eq(value.as_bytes(), secret.as_bytes()));
        if !accepted {
            tracing::warn!(path = %request.uri().path(), "rejected request without valid authorization");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Unauthorized",
                    "message": "Invalid or missing authorization header"
                })),
            )
                .into_response());
        }
    }

    Ok(next.run(request).await)
}

/// Compares two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
