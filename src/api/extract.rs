//! Request extractors
//!
//! Thin wrappers over axum's `Json`, `Query` and `Path` whose rejections
//! are reported as `AppError::Validation`, so malformed input gets the
//! same `{error, code}` body as every other failure.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameter extractor
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Credentials {
        #[allow(dead_code)]
        username: String,
        #[allow(dead_code)]
        email: String,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        limit: Option<i64>,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_json_field_is_a_validation_error() {
        let rejection = Json::<Credentials>::from_request(json_request(r#"{"username":"a"}"#), &())
            .await
            .unwrap_err();

        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejection.code(), "validation");
        assert!(rejection.to_string().contains("email"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let rejection = Json::<Credentials>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(rejection.code(), "validation");
    }

    #[tokio::test]
    async fn bad_query_value_is_a_validation_error() {
        let request = Request::builder()
            .uri("/posts?limit=abc")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let rejection = Query::<Paging>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejection.code(), "validation");
    }
}
