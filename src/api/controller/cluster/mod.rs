use axum::extract::{Query, State};
use axum::Json;

use crate::api::dto::{ApiResponse, ClusterResourcesQuery};
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::cluster::model::{ClusterResourceTotals, ResourceTotals};
use crate::errors::AppError;

pub struct ClusterController;

impl ClusterController {
    pub async fn total_resources(
        State(state): State<AppState>,
        Query(q): Query<ClusterResourcesQuery>,
    ) -> Result<Json<ApiResponse<ClusterResourceTotals>>, AppError> {
        to_json(state.cluster_service.total_resources(q.filter(), q.source).await)
    }

    pub async fn available_resources(
        State(state): State<AppState>,
        Query(q): Query<ClusterResourcesQuery>,
    ) -> Result<Json<ApiResponse<ResourceTotals>>, AppError> {
        to_json(state.cluster_service.available_resources(q.filter()).await)
    }

    pub async fn labels(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<ClusterResourceTotals>>, AppError> {
        to_json(state.cluster_service.cluster_labels().await)
    }
}
