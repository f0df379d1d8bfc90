//! Integrates Prometheus range-query series into resource-hours.
//!
//! Each series is one (namespace, pod, resource) triple sampled at roughly the
//! query step. Its integral is `sum(values) * effective_step`, where the
//! effective step is measured from the series' own timestamps, so series cut
//! short by data gaps are not over-counted.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::usage::model::{ResourceHours, TimeSeries, UsageWindow};

pub const RESOURCE_LABEL: &str = "resource";
pub const NODE_LABEL: &str = "node";
pub const UNKNOWN_RESOURCE: &str = "unknown";
pub const DEFAULT_PHASE: &str = "Running";

const SECONDS_PER_HOUR: f64 = 3600.0;

fn parse_sample(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Mean spacing between the first and last sample, or the nominal step when
/// there are fewer than two samples (or the timestamps are not increasing).
pub fn effective_step(timestamps: &[f64], nominal_step_seconds: f64) -> f64 {
    if timestamps.len() < 2 {
        return nominal_step_seconds;
    }
    let first = timestamps[0];
    let last = timestamps[timestamps.len() - 1];
    let step = (last - first) / (timestamps.len() - 1) as f64;
    if step > 0.0 {
        step
    } else {
        nominal_step_seconds
    }
}

/// Resource-hours of one series, or `None` when it has no samples at all.
pub fn series_resource_hours(series: &TimeSeries, step_seconds: u64) -> Option<f64> {
    if series.values.is_empty() {
        return None;
    }

    let timestamps: Vec<f64> = series.values.iter().map(|(ts, _)| *ts).collect();
    let step = effective_step(&timestamps, step_seconds as f64);

    let mut total = 0.0;
    for (ts, raw) in &series.values {
        match parse_sample(raw) {
            Some(v) => total += v,
            None => debug!("Skipping unparsable sample '{}' at {}", raw, ts),
        }
    }

    Some(total * step / SECONDS_PER_HOUR)
}

/// Resource-hours per resource over the window. Every requested resource is
/// present in the result, at zero when no series reported it. With
/// `normalize`, totals are divided by the window length in hours.
pub fn cumulative_usage(
    series: &[TimeSeries],
    resources: &[String],
    window: &UsageWindow,
    step_seconds: u64,
    normalize: bool,
) -> ResourceHours {
    let mut hours: ResourceHours = resources.iter().map(|r| (r.clone(), 0.0)).collect();

    for s in series {
        let resource = s.label(RESOURCE_LABEL).unwrap_or(UNKNOWN_RESOURCE);
        if let Some(h) = series_resource_hours(s, step_seconds) {
            *hours.entry(resource.to_string()).or_insert(0.0) += h;
        }
    }

    let duration_hours = window.duration_hours();
    if normalize && duration_hours > 0.0 {
        for value in hours.values_mut() {
            *value /= duration_hours;
        }
    }

    hours
}

/// Fold raw resource names into display buckets by summation. Keys without a
/// mapping pass through unchanged.
pub fn remap_resources(hours: &ResourceHours, mapping: &BTreeMap<String, String>) -> ResourceHours {
    let mut out = ResourceHours::new();
    for (resource, value) in hours {
        let key = mapping.get(resource).unwrap_or(resource);
        *out.entry(key.clone()).or_insert(0.0) += value;
    }
    out
}

/// Average of each node's readiness series, i.e. the fraction of the window
/// the node reported Ready.
pub fn node_uptime(series: &[TimeSeries]) -> BTreeMap<String, f64> {
    let mut uptime = BTreeMap::new();
    for s in series {
        let Some(node) = s.label(NODE_LABEL) else {
            continue;
        };
        let samples: Vec<f64> = s.values.iter().filter_map(|(_, raw)| parse_sample(raw)).collect();
        if samples.is_empty() {
            continue;
        }
        uptime.insert(node.to_string(), samples.iter().sum::<f64>() / samples.len() as f64);
    }
    uptime
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `a|b|c` for a `=~` matcher; each value matches literally.
fn regex_alternation(values: &[String]) -> String {
    values
        .iter()
        .map(|v| escape_label_value(&regex::escape(v)))
        .collect::<Vec<_>>()
        .join("|")
}

/// PromQL for per-pod resource requests of pods in `phase`, optionally
/// restricted to some namespaces and nodes. Node filtering joins against
/// `kube_pod_info`, which carries the pod → node mapping.
pub fn build_usage_query(
    resources: &[String],
    phase: &str,
    namespaces: Option<&[String]>,
    nodes: Option<&[String]>,
) -> String {
    let mut filters = vec![format!("resource=~\"{}\"", regex_alternation(resources))];
    if let Some(ns) = namespaces.filter(|ns| !ns.is_empty()) {
        filters.push(format!("namespace=~\"{}\"", regex_alternation(ns)));
    }
    let base = format!("kube_pod_container_resource_requests{{{}}}", filters.join(","));

    let left_expr = match nodes.filter(|n| !n.is_empty()) {
        Some(nodes) => format!(
            "({}) * on(namespace, pod) group_left(node) (kube_pod_info{{node=~\"{}\"}})",
            base,
            regex_alternation(nodes)
        ),
        None => base,
    };

    format!(
        "max by (namespace, pod, resource) ({}) * on(namespace, pod) group_left() (kube_pod_status_phase{{phase=\"{}\"}} == 1)",
        left_expr,
        escape_label_value(phase)
    )
}

pub fn build_node_readiness_query(nodes: &[String], step_seconds: u64) -> String {
    format!(
        "avg_over_time(kube_node_status_condition{{condition=\"Ready\", status=\"true\", node=~\"{}\"}}[{}s])",
        regex_alternation(nodes),
        step_seconds
    )
}
