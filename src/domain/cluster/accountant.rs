//! Cluster resource accounting over an already-fetched `ClusterSnapshot`.
//!
//! Everything here is pure: no API calls, no cached state. Quantities that do
//! not parse are skipped, never fatal, and negative availability (stale
//! snapshots, transient over-commit) is passed through unclamped.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::core::util::quantity::{parse_quantity, ResourceQuantity};
use crate::domain::cluster::model::{
    ClusterResourceTotals, ClusterSnapshot, GpuDevice, NodeFilter, NodeGpuInventory,
    NodeResources, NodeSnapshot, PodSnapshot, PodStatusEntry, ResourceSource, ResourceTotals,
    UnschedulablePod, PODS_RESOURCE, POD_PHASE_PENDING,
};

pub const GPU_RESOURCES: &[&str] = &["nvidia.com/gpu", "amd.com/gpu"];
pub const DEFAULT_PRESSURES: &[&str] = &["DiskPressure", "MemoryPressure", "PIDPressure"];
pub const DEFAULT_FAILING_STATUSES: &[&str] = &["Failed", "Unknown"];

/// Minimum comma-separated fields in one GPU device record.
const GPU_RECORD_MIN_FIELDS: usize = 6;
const GPU_FIELD_MEMORY: usize = 2;
const GPU_FIELD_MODEL: usize = 4;
const GPU_FIELD_HEALTH: usize = 6;

/// Parse every value of `resources` and add it into `out`, skipping values
/// that are not quantities.
pub fn add_parsed(
    resources: &BTreeMap<String, String>,
    out: &mut BTreeMap<String, ResourceQuantity>,
) {
    for (resource, raw) in resources {
        match parse_quantity(raw) {
            Some(q) => *out.entry(resource.clone()).or_default() += q,
            None => debug!("Skipping unparsable value '{}' for '{}'", raw, resource),
        }
    }
}

fn parse_map(resources: &BTreeMap<String, String>) -> BTreeMap<String, ResourceQuantity> {
    let mut out = BTreeMap::new();
    add_parsed(resources, &mut out);
    out
}

/// Sum the map picked by `select` over the filtered nodes. Every node counts
/// into `total`; only Ready nodes count into `online`.
pub fn aggregate_with<F>(nodes: &[NodeSnapshot], filter: &NodeFilter, select: F) -> ClusterResourceTotals
where
    F: Fn(&NodeSnapshot) -> &BTreeMap<String, String>,
{
    let mut data = ClusterResourceTotals::default();

    for node in nodes.iter().filter(|n| filter.matches(n)) {
        let resources = select(node);
        if node.ready {
            data.online.n_nodes += 1;
            add_parsed(resources, &mut data.online.resources);
            data.online_nodes.insert(node.name.clone());
        }
        data.total.n_nodes += 1;
        add_parsed(resources, &mut data.total.resources);
    }

    data
}

pub fn aggregate(nodes: &[NodeSnapshot], filter: &NodeFilter, source: ResourceSource) -> ClusterResourceTotals {
    aggregate_with(nodes, filter, |node| source.select(node))
}

/// Numeric node labels summed across the cluster, split online/total.
pub fn cluster_labels(snapshot: &ClusterSnapshot) -> ClusterResourceTotals {
    aggregate(&snapshot.nodes, &NodeFilter::all(), ResourceSource::Labels)
}

/// Subtract the container requests of `pod` for every resource already
/// tracked in `available`.
fn subtract_requests(pod: &PodSnapshot, available: &mut BTreeMap<String, ResourceQuantity>) {
    for container in &pod.containers {
        for (resource, raw) in &container.requests {
            let Some(slot) = available.get_mut(resource) else {
                continue;
            };
            match parse_quantity(raw) {
                Some(q) => *slot -= q,
                None => debug!(
                    "Skipping unparsable request '{}' for '{}' in {}/{}",
                    raw, resource, pod.namespace, pod.name
                ),
            }
        }
    }
}

fn running_pods_on<'a>(pods: &'a [PodSnapshot], node_name: &'a str) -> impl Iterator<Item = &'a PodSnapshot> {
    pods.iter()
        .filter(move |p| p.is_running() && p.node_name.as_deref() == Some(node_name))
}

/// Online allocatable resources minus the requests of every Running pod placed
/// on an online node. The `pods` counter drops by one per such pod.
pub fn available(snapshot: &ClusterSnapshot, filter: &NodeFilter) -> ResourceTotals {
    let totals = aggregate(&snapshot.nodes, filter, ResourceSource::Allocatable);
    let mut available = totals.online.clone();

    for pod in snapshot.pods.iter().filter(|p| p.is_running()) {
        let Some(node_name) = pod.node_name.as_deref() else {
            continue;
        };
        if !totals.online_nodes.contains(node_name) {
            continue;
        }
        if let Some(slot) = available.resources.get_mut(PODS_RESOURCE) {
            *slot -= ResourceQuantity(1.0);
        }
        subtract_requests(pod, &mut available.resources);
    }

    for (resource, q) in &available.resources {
        if q.value() < 0.0 {
            warn!("Available '{}' is negative ({}); snapshot may be stale", resource, q.value());
        }
    }

    available
}

/// Per-node capacity, allocatable and what is left after Running pod requests.
pub fn node_resources(snapshot: &ClusterSnapshot, filter: &NodeFilter) -> BTreeMap<String, NodeResources> {
    snapshot
        .nodes
        .iter()
        .filter(|n| filter.matches(n))
        .map(|node| {
            let allocatable = parse_map(&node.allocatable);
            let mut available = allocatable.clone();
            for pod in running_pods_on(&snapshot.pods, &node.name) {
                if let Some(slot) = available.get_mut(PODS_RESOURCE) {
                    *slot -= ResourceQuantity(1.0);
                }
                subtract_requests(pod, &mut available);
            }

            (
                node.name.clone(),
                NodeResources {
                    ready: node.ready,
                    schedulable: node.schedulable,
                    capacity: parse_map(&node.capacity),
                    allocatable,
                    available,
                },
            )
        })
        .collect()
}

fn sum_gpu_keys(resources: &BTreeMap<String, String>) -> ResourceQuantity {
    let mut total = ResourceQuantity::ZERO;
    for key in GPU_RESOURCES {
        if let Some(q) = resources.get(*key).and_then(|raw| parse_quantity(raw)) {
            total += q;
        }
    }
    total
}

/// Parse a GPU registration annotation: device records separated by `:`,
/// fields within a record separated by `,`. Records with too few fields are
/// dropped on their own.
pub fn parse_gpu_devices(raw: &str, node_ready: bool) -> Vec<GpuDevice> {
    raw.split(':')
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let fields: Vec<&str> = record.split(',').map(str::trim).collect();
            if fields.len() < GPU_RECORD_MIN_FIELDS {
                warn!("Skipping malformed GPU record '{}' ({} fields)", record, fields.len());
                return None;
            }
            let ready = fields
                .get(GPU_FIELD_HEALTH)
                .map(|h| h.eq_ignore_ascii_case("true"))
                .unwrap_or(node_ready);
            Some(GpuDevice {
                model: fields[GPU_FIELD_MODEL].to_string(),
                memory: fields[GPU_FIELD_MEMORY].to_string(),
                ready,
            })
        })
        .collect()
}

/// GPU capacity, availability and device details per node. Nodes without GPU
/// capacity or device records are left out.
pub fn gpu_inventory(
    snapshot: &ClusterSnapshot,
    filter: &NodeFilter,
    annotation_key: &str,
) -> BTreeMap<String, NodeGpuInventory> {
    let mut inventory = BTreeMap::new();

    for node in snapshot.nodes.iter().filter(|n| filter.matches(n)) {
        let gpus = node
            .annotations
            .get(annotation_key)
            .map(|raw| parse_gpu_devices(raw, node.ready))
            .unwrap_or_default();
        let capacity = sum_gpu_keys(&node.capacity);
        if gpus.is_empty() && capacity.value() == 0.0 {
            continue;
        }

        let mut available = sum_gpu_keys(&node.allocatable);
        for pod in running_pods_on(&snapshot.pods, &node.name) {
            for container in &pod.containers {
                available -= sum_gpu_keys(&container.requests);
            }
        }

        inventory.insert(
            node.name.clone(),
            NodeGpuInventory {
                available,
                capacity,
                gpus,
            },
        );
    }

    inventory
}

pub fn node_labels(snapshot: &ClusterSnapshot, filter: &NodeFilter) -> BTreeMap<String, BTreeMap<String, String>> {
    snapshot
        .nodes
        .iter()
        .filter(|n| filter.matches(n))
        .map(|n| (n.name.clone(), n.labels.clone()))
        .collect()
}

/// Names of the nodes carrying every given label.
pub fn nodes_with_labels(snapshot: &ClusterSnapshot, labels: &BTreeMap<String, String>) -> Vec<String> {
    let filter = NodeFilter {
        node_names: None,
        node_labels: Some(labels.clone()),
    };
    snapshot
        .nodes
        .iter()
        .filter(|n| filter.matches(n))
        .map(|n| n.name.clone())
        .collect()
}

/// Condition states per node, optionally restricted to some condition types.
pub fn node_conditions(
    snapshot: &ClusterSnapshot,
    conditions: Option<&[String]>,
) -> BTreeMap<String, BTreeMap<String, bool>> {
    snapshot
        .nodes
        .iter()
        .map(|node| {
            let states = node
                .conditions
                .iter()
                .filter(|(kind, _)| conditions.map_or(true, |wanted| wanted.iter().any(|w| w == *kind)))
                .map(|(kind, state)| (kind.clone(), *state))
                .collect();
            (node.name.clone(), states)
        })
        .collect()
}

/// Nodes with at least one active pressure condition, and which ones.
pub fn nodes_with_pressure(
    snapshot: &ClusterSnapshot,
    pressures: &[String],
) -> BTreeMap<String, BTreeMap<String, bool>> {
    node_conditions(snapshot, Some(pressures))
        .into_iter()
        .filter_map(|(node, states)| {
            let active: BTreeMap<String, bool> = states.into_iter().filter(|(_, on)| *on).collect();
            (!active.is_empty()).then_some((node, active))
        })
        .collect()
}

/// Scheduled pods whose phase is one of `statuses`, optionally restricted to
/// some nodes.
pub fn pods_with_status(
    snapshot: &ClusterSnapshot,
    node_names: Option<&[String]>,
    statuses: &[String],
) -> Vec<PodStatusEntry> {
    snapshot
        .pods
        .iter()
        .filter_map(|pod| {
            let node = pod.node_name.as_deref()?;
            if let Some(names) = node_names {
                if !names.iter().any(|n| n == node) {
                    return None;
                }
            }
            if !statuses.iter().any(|s| s == &pod.phase) {
                return None;
            }
            Some(PodStatusEntry {
                name: pod.name.clone(),
                namespace: pod.namespace.clone(),
                node: node.to_string(),
                phase: pod.phase.clone(),
            })
        })
        .collect()
}

/// Pending pods the scheduler rejected for lack of resources.
pub fn unschedulable_pods(snapshot: &ClusterSnapshot) -> BTreeMap<String, UnschedulablePod> {
    snapshot
        .pods
        .iter()
        .filter(|pod| pod.phase == POD_PHASE_PENDING)
        .filter_map(|pod| {
            let condition = pod.conditions.iter().find(|c| {
                c.reason.as_deref() == Some("Unschedulable")
                    && c.message.as_deref().is_some_and(|m| m.contains("Insufficient"))
            })?;
            Some((
                pod.name.clone(),
                UnschedulablePod {
                    namespace: pod.namespace.clone(),
                    reason: condition.message.clone().unwrap_or_default(),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::model::{ContainerResources, PodConditionSnapshot};

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn node(name: &str, ready: bool, capacity: &[(&str, &str)]) -> NodeSnapshot {
        NodeSnapshot {
            name: name.to_string(),
            ready,
            schedulable: true,
            capacity: map(capacity),
            allocatable: map(capacity),
            conditions: BTreeMap::from([("Ready".to_string(), ready)]),
            ..Default::default()
        }
    }

    fn running_pod(name: &str, node: &str, requests: &[(&str, &str)]) -> PodSnapshot {
        PodSnapshot {
            name: name.to_string(),
            namespace: "default".to_string(),
            node_name: Some(node.to_string()),
            phase: "Running".to_string(),
            containers: vec![ContainerResources {
                name: "main".to_string(),
                requests: map(requests),
                limits: BTreeMap::new(),
            }],
            ..Default::default()
        }
    }

    fn two_node_cluster() -> Vec<NodeSnapshot> {
        vec![
            node("node-a", true, &[("cpu", "4"), ("memory", "8388608Ki"), ("pods", "110")]),
            node("node-b", false, &[("cpu", "2"), ("memory", "4194304Ki"), ("pods", "110")]),
        ]
    }

    #[test]
    fn capacity_scenario_splits_online_and_total() {
        let nodes = two_node_cluster();
        let totals = aggregate(&nodes, &NodeFilter::all(), ResourceSource::Capacity);

        assert_eq!(totals.total.get("cpu").value(), 6.0);
        assert_eq!(totals.online.get("cpu").value(), 4.0);
        assert_eq!(totals.total.n_nodes, 2);
        assert_eq!(totals.online.n_nodes, 1);
        assert_eq!(totals.total.get("memory").value(), (8388608.0 + 4194304.0) * 1024.0);
    }

    #[test]
    fn totals_are_additive_and_online_is_a_subset() {
        let mut nodes = two_node_cluster();
        nodes.push(node("node-c", true, &[("cpu", "500m"), ("memory", "1Gi"), ("hugepages-2Mi", "0")]));
        let totals = aggregate(&nodes, &NodeFilter::all(), ResourceSource::Capacity);

        for resource in ["cpu", "memory", "pods", "hugepages-2Mi"] {
            let expected: f64 = nodes
                .iter()
                .filter_map(|n| n.capacity.get(resource))
                .filter_map(|raw| parse_quantity(raw))
                .map(|q| q.value())
                .sum();
            assert_eq!(totals.total.get(resource).value(), expected, "{resource}");
            assert!(totals.online.get(resource) <= totals.total.get(resource), "{resource}");
        }
    }

    #[test]
    fn unparsable_values_are_skipped() {
        let nodes = vec![node("node-a", true, &[("cpu", "4"), ("example.com/weird", "lots")])];
        let totals = aggregate(&nodes, &NodeFilter::all(), ResourceSource::Capacity);

        assert_eq!(totals.total.get("cpu").value(), 4.0);
        assert!(!totals.total.resources.contains_key("example.com/weird"));
    }

    #[test]
    fn node_filter_restricts_aggregation() {
        let nodes = two_node_cluster();
        let totals = aggregate(&nodes, &NodeFilter::names(["node-b"]), ResourceSource::Capacity);

        assert_eq!(totals.total.n_nodes, 1);
        assert_eq!(totals.total.get("cpu").value(), 2.0);
        assert_eq!(totals.online.n_nodes, 0);
    }

    #[test]
    fn available_subtracts_running_requests_on_online_nodes() {
        let snapshot = ClusterSnapshot {
            nodes: two_node_cluster(),
            pods: vec![
                running_pod("web", "node-a", &[("cpu", "1500m"), ("memory", "1Gi")]),
                running_pod("stale", "node-b", &[("cpu", "1")]),
                PodSnapshot {
                    phase: "Succeeded".to_string(),
                    ..running_pod("done", "node-a", &[("cpu", "1")])
                },
            ],
        };

        let available = available(&snapshot, &NodeFilter::all());

        assert_eq!(available.get("cpu").value(), 2.5);
        assert_eq!(available.get("pods").value(), 109.0);
        assert_eq!(
            available.get("memory").value(),
            8388608.0 * 1024.0 - 1024.0 * 1024.0 * 1024.0
        );
        assert_eq!(available.n_nodes, 1);
    }

    #[test]
    fn available_does_not_invent_a_pods_counter() {
        let snapshot = ClusterSnapshot {
            nodes: vec![node("node-a", true, &[("cpu", "4")])],
            pods: vec![
                running_pod("one", "node-a", &[("cpu", "1")]),
                running_pod("two", "node-a", &[("cpu", "1")]),
            ],
        };

        let available = available(&snapshot, &NodeFilter::all());

        assert_eq!(available.get("cpu").value(), 2.0);
        assert!(!available.resources.contains_key(PODS_RESOURCE));
    }

    #[test]
    fn available_counts_micro_cpu_requests() {
        let snapshot = ClusterSnapshot {
            nodes: vec![node("node-a", true, &[("cpu", "1")])],
            pods: vec![running_pod("tiny", "node-a", &[("cpu", "100u")])],
        };

        let available = available(&snapshot, &NodeFilter::all());

        assert_eq!(available.get("cpu").value(), 1.0 - 0.0001);
    }

    #[test]
    fn available_passes_negative_values_through() {
        let snapshot = ClusterSnapshot {
            nodes: vec![node("node-a", true, &[("cpu", "1")])],
            pods: vec![running_pod("greedy", "node-a", &[("cpu", "3")])],
        };

        let available = available(&snapshot, &NodeFilter::all());
        assert_eq!(available.get("cpu").value(), -2.0);
    }

    #[test]
    fn requests_for_untracked_resources_are_ignored() {
        let snapshot = ClusterSnapshot {
            nodes: vec![node("node-a", true, &[("cpu", "4")])],
            pods: vec![running_pod("gpu-job", "node-a", &[("nvidia.com/gpu", "1")])],
        };

        let available = available(&snapshot, &NodeFilter::all());
        assert!(!available.resources.contains_key("nvidia.com/gpu"));
    }

    #[test]
    fn gpu_records_with_too_few_fields_are_skipped() {
        let raw = "GPU-0,10,24576,100,NVIDIA-RTX-3090,0,true:GPU-1,10,8192:GPU-2,10,16384,100,NVIDIA-A4000,0,false:";
        let devices = parse_gpu_devices(raw, true);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].model, "NVIDIA-RTX-3090");
        assert_eq!(devices[0].memory, "24576");
        assert!(devices[0].ready);
        assert!(!devices[1].ready);
    }

    #[test]
    fn gpu_inventory_reports_capacity_and_available() {
        let mut gpu_node = node("gpu-node", true, &[("cpu", "16"), ("nvidia.com/gpu", "2")]);
        gpu_node.annotations.insert(
            "hami.io/node-nvidia-register".to_string(),
            "GPU-0,10,24576,100,NVIDIA-RTX-3090,0:GPU-1,10,24576,100,NVIDIA-RTX-3090,0".to_string(),
        );
        let snapshot = ClusterSnapshot {
            nodes: vec![gpu_node, node("cpu-node", true, &[("cpu", "8")])],
            pods: vec![running_pod("train", "gpu-node", &[("nvidia.com/gpu", "1")])],
        };

        let inventory = gpu_inventory(&snapshot, &NodeFilter::all(), "hami.io/node-nvidia-register");

        assert_eq!(inventory.len(), 1);
        let gpu = &inventory["gpu-node"];
        assert_eq!(gpu.capacity.value(), 2.0);
        assert_eq!(gpu.available.value(), 1.0);
        assert_eq!(gpu.gpus.len(), 2);
        assert!(gpu.gpus.iter().all(|d| d.ready));
    }

    #[test]
    fn pressure_only_reports_active_conditions() {
        let mut pressured = node("node-a", true, &[]);
        pressured.conditions.insert("DiskPressure".to_string(), true);
        pressured.conditions.insert("MemoryPressure".to_string(), false);
        let mut calm = node("node-b", true, &[]);
        calm.conditions.insert("DiskPressure".to_string(), false);
        let snapshot = ClusterSnapshot {
            nodes: vec![pressured, calm],
            pods: vec![],
        };
        let pressures: Vec<String> = DEFAULT_PRESSURES.iter().map(|s| s.to_string()).collect();

        let result = nodes_with_pressure(&snapshot, &pressures);

        assert_eq!(result.len(), 1);
        assert_eq!(result["node-a"], BTreeMap::from([("DiskPressure".to_string(), true)]));
    }

    #[test]
    fn unschedulable_pods_require_insufficient_resources() {
        let pending = |name: &str, message: &str| PodSnapshot {
            name: name.to_string(),
            namespace: "team-a".to_string(),
            phase: "Pending".to_string(),
            conditions: vec![PodConditionSnapshot {
                type_: "PodScheduled".to_string(),
                status: "False".to_string(),
                reason: Some("Unschedulable".to_string()),
                message: Some(message.to_string()),
            }],
            ..Default::default()
        };
        let snapshot = ClusterSnapshot {
            nodes: vec![],
            pods: vec![
                pending("big", "0/3 nodes are available: 3 Insufficient nvidia.com/gpu."),
                pending("tainted", "0/3 nodes are available: 3 node(s) had untolerated taint."),
            ],
        };

        let result = unschedulable_pods(&snapshot);

        assert_eq!(result.len(), 1);
        assert_eq!(result["big"].namespace, "team-a");
    }

    #[test]
    fn pods_with_status_filters_by_node_and_phase() {
        let mut failed = running_pod("crashed", "node-a", &[]);
        failed.phase = "Failed".to_string();
        let snapshot = ClusterSnapshot {
            nodes: two_node_cluster(),
            pods: vec![failed, running_pod("ok", "node-a", &[])],
        };
        let statuses: Vec<String> = DEFAULT_FAILING_STATUSES.iter().map(|s| s.to_string()).collect();

        let all = pods_with_status(&snapshot, None, &statuses);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "crashed");

        let other_node = ["node-b".to_string()];
        assert!(pods_with_status(&snapshot, Some(&other_node), &statuses).is_empty());
    }

    #[test]
    fn node_resources_breaks_down_per_node() {
        let snapshot = ClusterSnapshot {
            nodes: two_node_cluster(),
            pods: vec![running_pod("web", "node-a", &[("cpu", "1")])],
        };

        let per_node = node_resources(&snapshot, &NodeFilter::all());

        assert_eq!(per_node["node-a"].available["cpu"].value(), 3.0);
        assert_eq!(per_node["node-a"].available["pods"].value(), 109.0);
        assert_eq!(per_node["node-b"].available["cpu"].value(), 2.0);
        assert!(!per_node["node-b"].ready);
    }

    #[test]
    fn label_filter_selects_matching_nodes() {
        let mut labelled = node("node-a", true, &[]);
        labelled.labels.insert("gpu".to_string(), "true".to_string());
        let snapshot = ClusterSnapshot {
            nodes: vec![labelled, node("node-b", true, &[])],
            pods: vec![],
        };

        let names = nodes_with_labels(&snapshot, &map(&[("gpu", "true")]));
        assert_eq!(names, vec!["node-a".to_string()]);
    }
}
