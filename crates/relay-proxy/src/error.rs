//! Pipeline error kinds and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Every way a single forwarding can fail. All variants are terminal for the
/// request and render as a JSON body `{"status": <code>, "detail": <text>}`.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Missing 'url' query parameter")]
    MissingTarget,

    #[error("Invalid 'url' query parameter: {0}")]
    InvalidTargetUrl(String),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Error forwarding request: {0}")]
    Forwarding(String),

    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl ForwardError {
    /// Wrap an outbound client failure, keeping the whole cause chain
    /// (reqwest's own message omits the underlying io/dns/tls error).
    pub fn forwarding(err: &reqwest::Error) -> Self {
        let mut detail = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        ForwardError::Forwarding(detail)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::MissingTarget
            | ForwardError::InvalidTargetUrl(_)
            | ForwardError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ForwardError::Forwarding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::NotFound => StatusCode::NOT_FOUND,
            ForwardError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "status": status.as_u16(),
            "detail": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_target_renders_400() {
        let response = ForwardError::MissingTarget.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["detail"], "Missing 'url' query parameter");
    }

    #[tokio::test]
    async fn test_forwarding_renders_500_with_cause() {
        let response = ForwardError::Forwarding("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
        assert_eq!(body["detail"], "Error forwarding request: connection refused");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ForwardError::InvalidTargetUrl("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ForwardError::BodyRead("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ForwardError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ForwardError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
