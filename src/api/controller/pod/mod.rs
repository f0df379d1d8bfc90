use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::api::util::json::{parse_body, to_json};
use crate::app_state::AppState;
use crate::domain::cluster::dto::PodsWithStatusRequest;
use crate::domain::cluster::model::{PodStatusEntry, UnschedulablePod};
use crate::errors::AppError;

pub struct PodController;

impl PodController {
    pub async fn with_status(
        State(state): State<AppState>,
        payload: Result<Json<PodsWithStatusRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<Vec<PodStatusEntry>>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.cluster_service.pods_with_status(req).await)
    }

    pub async fn unschedulable(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<BTreeMap<String, UnschedulablePod>>>, AppError> {
        to_json(state.cluster_service.unschedulable_pods().await)
    }
}
