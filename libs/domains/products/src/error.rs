use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::sqlx::postgres::PgDatabaseError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    NotFound(String),

    /// A unique column (title or slug) is already taken; carries the store's detail
    #[error("{0}")]
    Conflict(String),

    /// Field errors, from the DTO derives or from checks such as the empty slug
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Postgres' `DETAIL` line, e.g. `Key (title)=(Chair) already exists.`
fn pg_detail(err: &DbErr) -> Option<String> {
    let (DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e))) = err
    else {
        return None;
    };

    e.as_database_error()?
        .try_downcast_ref::<PgDatabaseError>()?
        .detail()
        .map(str::to_string)
}

impl From<DbErr> for ProductError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                ProductError::Conflict(pg_detail(&err).unwrap_or(message))
            }
            _ => {
                tracing::error!(error = %err, "Unexpected database error");
                ProductError::Database(err.to_string())
            }
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(msg) => AppError::NotFound(msg),
            ProductError::Conflict(detail) => AppError::DuplicateValue(detail),
            ProductError::InvalidInput(errors) => AppError::ValidationError(errors),
            ProductError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_non_constraint_db_error_is_internal() {
        let err = ProductError::from(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, ProductError::Database(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_sqlx_error_has_no_pg_detail() {
        assert!(pg_detail(&DbErr::Custom("boom".into())).is_none());
        assert!(pg_detail(&DbErr::RecordNotFound("products".into())).is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_render_as_validation_error() {
        use axum_helpers::ErrorResponse;
        use http_body_util::BodyExt;

        let mut errors = ValidationErrors::new();
        errors.add("price", validator::ValidationError::new("range"));
        let response = ProductError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert!(body.details.unwrap().get("price").is_some());
    }

    #[test]
    fn test_conflict_is_client_error() {
        let err = ProductError::Conflict("Key (title)=(Chair) already exists.".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_status() {
        let err = ProductError::NotFound("Product with term 'lamp' not found".into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
