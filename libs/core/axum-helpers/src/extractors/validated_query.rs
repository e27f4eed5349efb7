//! Query string extractor with `validator` checks.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::Validate;

/// Like [`ValidatedJson`](super::ValidatedJson) for query parameters.
///
/// Text that can't be coerced to the target type (e.g. `?limit=ten`) and
/// values that break a rule (e.g. `?limit=0`) both reject as a 400
/// `VALIDATION_ERROR`.
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                AppError::InvalidInput(json!({
                    "query": [{
                        "code": "parse",
                        "message": e.body_text(),
                        "params": {}
                    }]
                }))
                .into_response()
            })?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Page {
        #[validate(range(min = 1))]
        limit: Option<i64>,
    }

    async fn handler(ValidatedQuery(page): ValidatedQuery<Page>) -> String {
        format!("{:?}", page.limit)
    }

    async fn status_for(uri: &str) -> StatusCode {
        let app = Router::new().route("/", get(handler));
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_accepts_absent_and_valid_values() {
        assert_eq!(status_for("/").await, StatusCode::OK);
        assert_eq!(status_for("/?limit=5").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejects_non_numeric_and_out_of_range() {
        assert_eq!(status_for("/?limit=ten").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_for("/?limit=0").await, StatusCode::BAD_REQUEST);
    }
}
