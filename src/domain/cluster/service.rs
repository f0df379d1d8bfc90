//! Async entry points: fetch one snapshot, hand it to the accountant.

use std::collections::BTreeMap;

use validator::Validate;

use crate::core::client::cluster_api::{fetch_cluster_snapshot, fetch_node_snapshot, ClusterApi};
use crate::domain::cluster::accountant::{
    self, DEFAULT_FAILING_STATUSES, DEFAULT_PRESSURES,
};
use crate::domain::cluster::dto::{NodeFilterRequest, NodesWithLabelsRequest, PodsWithStatusRequest};
use crate::domain::cluster::model::{
    ClusterResourceTotals, NodeFilter, NodeGpuInventory, NodeResources, PodStatusEntry,
    ResourceSource, ResourceTotals, UnschedulablePod,
};
use crate::errors::AppError;

fn owned(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|s| s.to_string()).collect()
}

pub async fn compute_cluster_totals(
    api: &dyn ClusterApi,
    filter: &NodeFilter,
    source: ResourceSource,
) -> Result<ClusterResourceTotals, AppError> {
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::aggregate(&snapshot.nodes, filter, source))
}

pub async fn compute_available_resources(
    api: &dyn ClusterApi,
    filter: &NodeFilter,
) -> Result<ResourceTotals, AppError> {
    let snapshot = fetch_cluster_snapshot(api).await?;
    Ok(accountant::available(&snapshot, filter))
}

pub async fn get_cluster_labels(api: &dyn ClusterApi) -> Result<ClusterResourceTotals, AppError> {
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::cluster_labels(&snapshot))
}

pub async fn get_node_labels(
    api: &dyn ClusterApi,
    req: NodeFilterRequest,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, AppError> {
    req.validate()?;
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::node_labels(&snapshot, &req.into()))
}

pub async fn get_nodes_with_labels(
    api: &dyn ClusterApi,
    req: NodesWithLabelsRequest,
) -> Result<Vec<String>, AppError> {
    req.validate()?;
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::nodes_with_labels(&snapshot, &req.labels))
}

pub async fn get_gpu_inventory(
    api: &dyn ClusterApi,
    req: NodeFilterRequest,
    annotation_key: &str,
) -> Result<BTreeMap<String, NodeGpuInventory>, AppError> {
    req.validate()?;
    let snapshot = fetch_cluster_snapshot(api).await?;
    Ok(accountant::gpu_inventory(&snapshot, &req.into(), annotation_key))
}

pub async fn get_node_resources(
    api: &dyn ClusterApi,
    req: NodeFilterRequest,
) -> Result<BTreeMap<String, NodeResources>, AppError> {
    req.validate()?;
    let snapshot = fetch_cluster_snapshot(api).await?;
    Ok(accountant::node_resources(&snapshot, &req.into()))
}

pub async fn get_node_conditions(
    api: &dyn ClusterApi,
    conditions: Option<Vec<String>>,
) -> Result<BTreeMap<String, BTreeMap<String, bool>>, AppError> {
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::node_conditions(&snapshot, conditions.as_deref()))
}

pub async fn get_nodes_with_pressure(
    api: &dyn ClusterApi,
    pressures: Option<Vec<String>>,
) -> Result<BTreeMap<String, BTreeMap<String, bool>>, AppError> {
    let pressures = pressures.unwrap_or_else(|| owned(DEFAULT_PRESSURES));
    let snapshot = fetch_node_snapshot(api).await?;
    Ok(accountant::nodes_with_pressure(&snapshot, &pressures))
}

pub async fn get_pods_with_status(
    api: &dyn ClusterApi,
    req: PodsWithStatusRequest,
) -> Result<Vec<PodStatusEntry>, AppError> {
    req.validate()?;
    let statuses = req.statuses.unwrap_or_else(|| owned(DEFAULT_FAILING_STATUSES));
    let snapshot = fetch_cluster_snapshot(api).await?;
    Ok(accountant::pods_with_status(&snapshot, req.node_names.as_deref(), &statuses))
}

pub async fn get_unschedulable_pods(
    api: &dyn ClusterApi,
) -> Result<BTreeMap<String, UnschedulablePod>, AppError> {
    let snapshot = fetch_cluster_snapshot(api).await?;
    Ok(accountant::unschedulable_pods(&snapshot))
}
