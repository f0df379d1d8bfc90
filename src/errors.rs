use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid required input; the caller must fix the request.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A single value could not be interpreted. Aggregations recover from
    /// this locally, so it only surfaces when the value was required.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    /// The Cluster API or Metrics API call failed.
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Body parsing error: {0}")]
    BodyParsingError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::ParseError(_) => "parse_error",
            AppError::TemplateError(_) => "template_error",
            AppError::UpstreamError(_) => "upstream_error",
            AppError::NotFound(_) => "not_found",
            AppError::BodyParsingError(_) => "body_parsing_error",
            AppError::InternalServerError(_) => "internal_server_error",
        }
    }
}

/// Helper for mapping a failed collaborator call into an upstream error
pub fn upstream_error<E: std::fmt::Display>(err: E) -> AppError {
    AppError::UpstreamError(err.to_string())
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::TemplateError(format!("{:#}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Choose status codes per variant
        let status = match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TemplateError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BodyParsingError(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let response = upstream_error("connection refused").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_failures_map_to_bad_request() {
        let err = AppError::ValidationError("Key value 'name' missing from values".into());
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
