use axum::{http::StatusCode, response::Response};

use super::{ErrorCode, error_response};

/// Fallback for unmatched routes
pub async fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "The requested route does not exist".to_string(),
        ErrorCode::NotFound,
    )
}
