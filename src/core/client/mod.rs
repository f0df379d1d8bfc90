// Kube-rs based Kubernetes client
pub mod kube_client;
pub mod kube_resources;
pub mod nodes;
pub mod pods;
pub mod mappers;
pub mod cluster_api;

// Metrics API
pub mod prometheus;
