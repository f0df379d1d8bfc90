//! API envelopes and query-string DTOs

use serde::{Deserialize, Serialize};

use crate::domain::cluster::model::{NodeFilter, ResourceSource};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// `a,b , c` → `["a", "b", "c"]`; blank input means "not given".
pub fn split_csv(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

#[derive(Deserialize, Debug, Default)]
pub struct ClusterResourcesQuery {
    pub source: Option<ResourceSource>,
    /// Comma-separated node names.
    pub node_names: Option<String>,
}

impl ClusterResourcesQuery {
    pub fn filter(&self) -> NodeFilter {
        NodeFilter {
            node_names: split_csv(self.node_names.as_deref()),
            node_labels: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct NodeConditionsQuery {
    /// Comma-separated condition types.
    pub conditions: Option<String>,
}

impl NodeConditionsQuery {
    pub fn list(&self) -> Option<Vec<String>> {
        split_csv(self.conditions.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_csv() {
        assert_eq!(split_csv(Some("a, b,,c ")), Some(vec!["a".into(), "b".into(), "c".into()]));
        assert_eq!(split_csv(Some(" , ")), None);
        assert_eq!(split_csv(None), None);
    }

    #[test]
    fn query_without_names_selects_all_nodes() {
        let q = ClusterResourcesQuery::default();
        assert!(q.filter().node_names.is_none());
    }
}
