use std::collections::BTreeMap;

use tracing::{debug, error};
use validator::Validate;

use crate::core::client::prometheus::MetricsApi;
use crate::domain::usage::aggregator::{
    build_node_readiness_query, build_usage_query, cumulative_usage, node_uptime, remap_resources,
    DEFAULT_PHASE,
};
use crate::domain::usage::dto::{ComputeUsageRequest, NodeUptimeRequest};
use crate::domain::usage::model::{ResourceHours, UsageWindow};
use crate::errors::{upstream_error, AppError};

/// Query → integrate → optional remap. A failed metrics call is returned as
/// `UpstreamError`, never raised.
pub async fn compute_usage_hours(
    api: &dyn MetricsApi,
    req: ComputeUsageRequest,
    default_step_seconds: u64,
) -> Result<ResourceHours, AppError> {
    req.validate()?;
    let window = UsageWindow::new(req.start, req.end)?;
    let step = req.step_seconds.unwrap_or(default_step_seconds);

    let promql = build_usage_query(
        &req.resources,
        DEFAULT_PHASE,
        req.namespaces.as_deref(),
        req.node_names.as_deref(),
    );

    let series = api
        .query_range(&promql, window.start, window.end, step)
        .await
        .map_err(|e| {
            error!("Usage query failed: {:#}", e);
            upstream_error(format!("{:#}", e))
        })?;
    debug!("Integrating {} usage series", series.len());

    let hours = cumulative_usage(&series, &req.resources, &window, step, req.normalize);
    Ok(match &req.resource_map {
        Some(mapping) => remap_resources(&hours, mapping),
        None => hours,
    })
}

pub async fn compute_node_uptime(
    api: &dyn MetricsApi,
    req: NodeUptimeRequest,
    default_step_seconds: u64,
) -> Result<BTreeMap<String, f64>, AppError> {
    req.validate()?;
    let window = UsageWindow::new(req.start, req.end)?;
    let step = req.step_seconds.unwrap_or(default_step_seconds);

    let promql = build_node_readiness_query(&req.node_names, step);
    let series = api
        .query_range(&promql, window.start, window.end, step)
        .await
        .map_err(|e| {
            error!("Node uptime query failed: {:#}", e);
            upstream_error(format!("{:#}", e))
        })?;

    Ok(node_uptime(&series))
}
