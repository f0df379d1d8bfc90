//! API route declarations (e.g., /api/v1/*)

pub mod cluster_routes;
pub mod job_routes;
pub mod node_routes;
pub mod pod_routes;
pub mod usage_routes;
