use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::api::util::json::{parse_body, to_json};
use crate::app_state::AppState;
use crate::domain::template::dto::{RenderCustomJobRequest, RenderJobRequest};
use crate::domain::template::engine::{RenderOutput, TemplateDefaults};
use crate::errors::AppError;

pub struct JobController;

impl JobController {
    pub async fn list_templates(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
        to_json(state.job_service.list_templates().await)
    }

    pub async fn template_defaults(
        State(state): State<AppState>,
        Path(name): Path<String>,
    ) -> Result<Json<ApiResponse<TemplateDefaults>>, AppError> {
        to_json(state.job_service.template_defaults(name).await)
    }

    pub async fn render(
        State(state): State<AppState>,
        payload: Result<Json<RenderJobRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<RenderOutput>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.job_service.render(req).await)
    }

    pub async fn render_custom(
        State(state): State<AppState>,
        payload: Result<Json<RenderCustomJobRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<RenderOutput>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.job_service.render_custom(req).await)
    }
}
