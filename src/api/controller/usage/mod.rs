use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::api::util::json::{parse_body, to_json};
use crate::app_state::AppState;
use crate::domain::usage::dto::{ComputeUsageRequest, NodeUptimeRequest};
use crate::domain::usage::model::ResourceHours;
use crate::errors::AppError;

pub struct UsageController;

impl UsageController {
    pub async fn compute_hours(
        State(state): State<AppState>,
        payload: Result<Json<ComputeUsageRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<ResourceHours>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.usage_service.compute_hours(req).await)
    }

    pub async fn node_uptime(
        State(state): State<AppState>,
        payload: Result<Json<NodeUptimeRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<BTreeMap<String, f64>>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.usage_service.node_uptime(req).await)
    }
}
