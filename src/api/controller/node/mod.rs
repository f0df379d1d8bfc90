use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::api::dto::{ApiResponse, NodeConditionsQuery};
use crate::api::util::json::{parse_body, to_json};
use crate::app_state::AppState;
use crate::domain::cluster::dto::{NodeFilterRequest, NodesWithLabelsRequest};
use crate::domain::cluster::model::{NodeGpuInventory, NodeResources};
use crate::errors::AppError;

type PerNode<T> = Json<ApiResponse<BTreeMap<String, T>>>;

pub struct NodeController;

impl NodeController {
    pub async fn labels(
        State(state): State<AppState>,
        payload: Result<Json<NodeFilterRequest>, JsonRejection>,
    ) -> Result<PerNode<BTreeMap<String, String>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.cluster_service.node_labels(req).await)
    }

    pub async fn with_labels(
        State(state): State<AppState>,
        payload: Result<Json<NodesWithLabelsRequest>, JsonRejection>,
    ) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.cluster_service.nodes_with_labels(req).await)
    }

    pub async fn gpus(
        State(state): State<AppState>,
        payload: Result<Json<NodeFilterRequest>, JsonRejection>,
    ) -> Result<PerNode<NodeGpuInventory>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.cluster_service.node_gpus(req).await)
    }

    pub async fn resources(
        State(state): State<AppState>,
        payload: Result<Json<NodeFilterRequest>, JsonRejection>,
    ) -> Result<PerNode<NodeResources>, AppError> {
        let req = parse_body(payload)?;
        to_json(state.cluster_service.node_resources(req).await)
    }

    pub async fn conditions(
        State(state): State<AppState>,
        Query(q): Query<NodeConditionsQuery>,
    ) -> Result<PerNode<BTreeMap<String, bool>>, AppError> {
        to_json(state.cluster_service.node_conditions(q.list()).await)
    }

    pub async fn pressure(
        State(state): State<AppState>,
        Query(q): Query<NodeConditionsQuery>,
    ) -> Result<PerNode<BTreeMap<String, bool>>, AppError> {
        to_json(state.cluster_service.nodes_with_pressure(q.list()).await)
    }
}
