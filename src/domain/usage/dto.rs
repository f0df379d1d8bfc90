use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComputeUsageRequest {
    /// Raw resource names as exported by kube-state-metrics (`cpu`, `nvidia_com_gpu`, ...).
    #[validate(length(min = 1))]
    pub resources: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Falls back to the configured step when absent.
    #[validate(range(min = 1))]
    pub step_seconds: Option<u64>,
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub node_names: Option<Vec<String>>,
    /// Raw name → display bucket.
    #[serde(default)]
    pub resource_map: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NodeUptimeRequest {
    #[validate(length(min = 1))]
    pub node_names: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub step_seconds: Option<u64>,
}
