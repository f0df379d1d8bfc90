/// Maps kube-rs / k8s-openapi types → accounting snapshots
use std::collections::BTreeMap;

use crate::core::client::kube_resources::{Node, Pod, Quantity};
use crate::domain::cluster::model::{
    ContainerResources, NodeSnapshot, PodConditionSnapshot, PodSnapshot,
};

fn raw_quantities(map: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    map.map(|m| m.iter().map(|(k, q)| (k.clone(), q.0.clone())).collect())
        .unwrap_or_default()
}

/// Converts a k8s-openapi Node object into a NodeSnapshot
pub fn map_node_to_snapshot(node: &Node) -> NodeSnapshot {
    let metadata = &node.metadata;
    let status = node.status.as_ref();

    let conditions: BTreeMap<String, bool> = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| (c.type_.clone(), c.status == "True"))
                .collect()
        })
        .unwrap_or_default();

    // A node without a Ready condition has never reported in
    let ready = conditions.get("Ready").copied().unwrap_or(false);

    let schedulable = !node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false);

    NodeSnapshot {
        name: metadata.name.clone().unwrap_or_default(),
        ready,
        schedulable,
        capacity: raw_quantities(status.and_then(|s| s.capacity.as_ref())),
        allocatable: raw_quantities(status.and_then(|s| s.allocatable.as_ref())),
        labels: metadata.labels.clone().unwrap_or_default(),
        annotations: metadata.annotations.clone().unwrap_or_default(),
        conditions,
    }
}

/// Converts a k8s-openapi Pod object into a PodSnapshot
pub fn map_pod_to_snapshot(pod: &Pod) -> PodSnapshot {
    let metadata = &pod.metadata;
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let containers = spec
        .map(|s| {
            s.containers
                .iter()
                .map(|c| {
                    let resources = c.resources.as_ref();
                    ContainerResources {
                        name: c.name.clone(),
                        requests: raw_quantities(resources.and_then(|r| r.requests.as_ref())),
                        limits: raw_quantities(resources.and_then(|r| r.limits.as_ref())),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| PodConditionSnapshot {
                    type_: c.type_.clone(),
                    status: c.status.clone(),
                    reason: c.reason.clone(),
                    message: c.message.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    PodSnapshot {
        name: metadata.name.clone().unwrap_or_default(),
        namespace: metadata.namespace.clone().unwrap_or_default(),
        node_name: spec.and_then(|s| s.node_name.clone()),
        phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
        labels: metadata.labels.clone().unwrap_or_default(),
        containers,
        conditions,
    }
}
