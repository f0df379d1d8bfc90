use anyhow::Result;
use async_trait::async_trait;
use kube::Client;
use tracing::debug;

use crate::core::client::mappers::{map_node_to_snapshot, map_pod_to_snapshot};
use crate::core::client::nodes::fetch_nodes;
use crate::core::client::pods::fetch_pods;
use crate::domain::cluster::model::{ClusterSnapshot, NodeSnapshot, PodSnapshot};
use crate::errors::{upstream_error, AppError};

/// Read side of the Cluster API, reduced to the snapshots accounting needs.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>>;
    async fn list_pods(&self) -> Result<Vec<PodSnapshot>>;
}

/// `ClusterApi` backed by a live kube-rs client.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>> {
        let nodes = fetch_nodes(&self.client).await?;
        Ok(nodes.iter().map(map_node_to_snapshot).collect())
    }

    async fn list_pods(&self) -> Result<Vec<PodSnapshot>> {
        let pods = fetch_pods(&self.client).await?;
        Ok(pods.iter().map(map_pod_to_snapshot).collect())
    }
}

/// Fetch nodes and pods concurrently into one snapshot for the request.
pub async fn fetch_cluster_snapshot(api: &dyn ClusterApi) -> Result<ClusterSnapshot, AppError> {
    let (nodes, pods) = futures::try_join!(api.list_nodes(), api.list_pods()).map_err(upstream_error)?;

    debug!("Cluster snapshot: {} node(s), {} pod(s)", nodes.len(), pods.len());
    Ok(ClusterSnapshot { nodes, pods })
}

/// Snapshot with nodes only, for queries that never look at pods.
pub async fn fetch_node_snapshot(api: &dyn ClusterApi) -> Result<ClusterSnapshot, AppError> {
    let nodes = api.list_nodes().await.map_err(upstream_error)?;

    Ok(ClusterSnapshot {
        nodes,
        pods: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPods;

    #[async_trait]
    impl ClusterApi for BrokenPods {
        async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>> {
            Ok(vec![NodeSnapshot {
                name: "node-a".to_string(),
                ..Default::default()
            }])
        }

        async fn list_pods(&self) -> Result<Vec<PodSnapshot>> {
            anyhow::bail!("apiserver unavailable")
        }
    }

    #[tokio::test]
    async fn failed_listing_surfaces_as_upstream_error() {
        let err = fetch_cluster_snapshot(&BrokenPods).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(msg) if msg.contains("apiserver unavailable")));
    }

    #[tokio::test]
    async fn node_snapshot_skips_pods() {
        let snapshot = fetch_node_snapshot(&BrokenPods).await.unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.pods.is_empty());
    }
}
