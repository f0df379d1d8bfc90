use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::util::quantity::ResourceQuantity;

pub const POD_PHASE_RUNNING: &str = "Running";
pub const POD_PHASE_PENDING: &str = "Pending";
pub const PODS_RESOURCE: &str = "pods";

/// Point-in-time view of one node, already pulled from the Cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub ready: bool,
    pub schedulable: bool,
    pub capacity: BTreeMap<String, String>,
    pub allocatable: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Every node condition type mapped to `status == "True"`.
    pub conditions: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerResources {
    pub name: String,
    pub requests: BTreeMap<String, String>,
    pub limits: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodConditionSnapshot {
    pub type_: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub node_name: Option<String>,
    pub phase: String,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerResources>,
    pub conditions: Vec<PodConditionSnapshot>,
}

impl PodSnapshot {
    pub fn is_running(&self) -> bool {
        self.phase == POD_PHASE_RUNNING
    }
}

/// Nodes and pods fetched once per request and shared by every accounting
/// function that serves it.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub pods: Vec<PodSnapshot>,
}

/// Which per-node map an aggregation reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSource {
    Capacity,
    #[default]
    Allocatable,
    Labels,
}

impl ResourceSource {
    pub fn select(self, node: &NodeSnapshot) -> &BTreeMap<String, String> {
        match self {
            ResourceSource::Capacity => &node.capacity,
            ResourceSource::Allocatable => &node.allocatable,
            ResourceSource::Labels => &node.labels,
        }
    }
}

/// Restricts the node set before aggregation. Explicit names win over labels;
/// an empty filter selects every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilter {
    pub node_names: Option<Vec<String>>,
    pub node_labels: Option<BTreeMap<String, String>>,
}

impl NodeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node_names: Some(names.into_iter().map(Into::into).collect()),
            node_labels: None,
        }
    }

    pub fn matches(&self, node: &NodeSnapshot) -> bool {
        if let Some(names) = &self.node_names {
            return names.iter().any(|n| n == &node.name);
        }
        if let Some(labels) = &self.node_labels {
            return labels
                .iter()
                .all(|(k, v)| node.labels.get(k).is_some_and(|actual| actual == v));
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTotals {
    pub n_nodes: u32,
    #[serde(flatten)]
    pub resources: BTreeMap<String, ResourceQuantity>,
}

impl ResourceTotals {
    pub fn get(&self, resource: &str) -> ResourceQuantity {
        self.resources.get(resource).copied().unwrap_or_default()
    }
}

/// `online` is summed over Ready nodes only, `total` over every selected node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResourceTotals {
    pub online: ResourceTotals,
    pub total: ResourceTotals,
    /// Names of the nodes that contributed to `online`.
    #[serde(skip)]
    pub online_nodes: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuDevice {
    pub model: String,
    pub memory: String,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGpuInventory {
    pub available: ResourceQuantity,
    pub capacity: ResourceQuantity,
    pub gpus: Vec<GpuDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResources {
    pub ready: bool,
    pub schedulable: bool,
    pub capacity: BTreeMap<String, ResourceQuantity>,
    pub allocatable: BTreeMap<String, ResourceQuantity>,
    pub available: BTreeMap<String, ResourceQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodStatusEntry {
    pub name: String,
    pub namespace: String,
    pub node: String,
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnschedulablePod {
    pub namespace: String,
    pub reason: String,
}
