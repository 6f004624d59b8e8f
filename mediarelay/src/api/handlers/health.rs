use axum::http::StatusCode;

/// Liveness check, always 200 with an empty body.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
