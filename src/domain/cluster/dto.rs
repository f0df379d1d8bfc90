use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::cluster::model::NodeFilter;

/// Body for node-scoped queries. Explicit names win over labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NodeFilterRequest {
    #[serde(default)]
    pub node_names: Option<Vec<String>>,
    #[serde(default)]
    pub node_labels: Option<BTreeMap<String, String>>,
}

impl From<NodeFilterRequest> for NodeFilter {
    fn from(req: NodeFilterRequest) -> Self {
        NodeFilter {
            node_names: req.node_names,
            node_labels: req.node_labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NodesWithLabelsRequest {
    #[validate(length(min = 1))]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PodsWithStatusRequest {
    #[serde(default)]
    pub node_names: Option<Vec<String>>,
    /// Defaults to `Failed` and `Unknown`.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub statuses: Option<Vec<String>>,
}
