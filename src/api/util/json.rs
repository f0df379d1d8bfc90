use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::errors::AppError;

/// Wrap a service result in the `ApiResponse` envelope; errors keep their
/// own status mapping.
pub fn to_json<T: serde::Serialize>(
    result: Result<T, AppError>,
) -> Result<Json<ApiResponse<T>>, AppError> {
    match result {
        Ok(value) => Ok(Json(ApiResponse::ok(value))),
        Err(err) => Err(err),
    }
}

/// Unwrap a JSON body, turning axum's rejection into `BodyParsingError`.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BodyParsingError(rejection.body_text()))
}
