use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use crate::app_state::AppState;

/// Build the main application router
pub fn app_router() -> Router<AppState> {
    // Cluster, node, pod, usage and job subrouters live under /api/v1
    let api_v1 = Router::new()
        .nest("/cluster", crate::api::routes::cluster_routes::cluster_routes())
        .nest("/nodes", crate::api::routes::node_routes::node_routes())
        .nest("/pods", crate::api::routes::pod_routes::pod_routes())
        .nest("/usage", crate::api::routes::usage_routes::usage_routes())
        .nest("/jobs", crate::api::routes::job_routes::job_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1)
        .fallback(handler_404)
        .layer(CorsLayer::very_permissive())
}

async fn root() -> &'static str {
    "Server is running!"
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{DateTime, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app_state::build_app_state;
    use crate::core::client::cluster_api::ClusterApi;
    use crate::core::client::prometheus::MetricsApi;
    use crate::core::config::AppConfig;
    use crate::core::template_store::InMemoryTemplateStore;
    use crate::domain::cluster::model::{NodeSnapshot, PodSnapshot};
    use crate::domain::template::engine::TemplateEngine;
    use crate::domain::template::identity::FixedSuffix;
    use crate::domain::usage::model::TimeSeries;

    struct StaticCluster;

    #[async_trait]
    impl ClusterApi for StaticCluster {
        async fn list_nodes(&self) -> anyhow::Result<Vec<NodeSnapshot>> {
            Ok(vec![
                NodeSnapshot {
                    name: "a".into(),
                    ready: true,
                    capacity: BTreeMap::from([("cpu".into(), "4".into())]),
                    allocatable: BTreeMap::from([("cpu".into(), "4".into())]),
                    ..Default::default()
                },
                NodeSnapshot {
                    name: "b".into(),
                    ready: false,
                    capacity: BTreeMap::from([("cpu".into(), "2".into())]),
                    allocatable: BTreeMap::from([("cpu".into(), "2".into())]),
                    ..Default::default()
                },
            ])
        }

        async fn list_pods(&self) -> anyhow::Result<Vec<PodSnapshot>> {
            Ok(Vec::new())
        }
    }

    struct DownMetrics;

    #[async_trait]
    impl MetricsApi for DownMetrics {
        async fn query_range(
            &self,
            _promql: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _step_seconds: u64,
        ) -> anyhow::Result<Vec<TimeSeries>> {
            anyhow::bail!("prometheus unreachable")
        }
    }

    fn app() -> Router {
        let store = InMemoryTemplateStore::new().with_template(
            "echo",
            "name: {{ job_name }}",
            "- name: id_field\n  default: name\n",
        );
        let engine = TemplateEngine::with_suffix_source(Arc::new(store), Arc::new(FixedSuffix("abcdef".into())));
        let state = build_app_state(
            &AppConfig::default(),
            Arc::new(StaticCluster),
            Arc::new(DownMetrics),
            Arc::new(engine),
        );
        app_router().with_state(state)
    }

    async fn call(req: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn total_resources_wraps_totals_in_envelope() {
        let (status, body) = call(get_req("/api/v1/cluster/total_resources?source=capacity")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total"]["cpu"], 6.0);
        assert_eq!(body["data"]["online"]["n_nodes"], 1);
    }

    #[tokio::test]
    async fn node_name_filter_comes_from_query() {
        let (_, body) = call(get_req("/api/v1/cluster/total_resources?node_names=b")).await;
        assert_eq!(body["data"]["total"]["cpu"], 2.0);
        assert_eq!(body["data"]["online"]["n_nodes"], 0);
    }

    #[tokio::test]
    async fn metrics_outage_maps_to_bad_gateway() {
        let (status, body) = call(post(
            "/api/v1/usage/compute_hours",
            json!({
                "resources": ["cpu"],
                "start": "2025-01-01T00:00:00Z",
                "end": "2025-01-01T01:00:00Z"
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_error");
    }

    #[tokio::test]
    async fn malformed_body_is_a_body_parsing_error() {
        let (status, body) = call(post("/api/v1/usage/compute_hours", json!({"resources": "cpu"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "body_parsing_error");
    }

    #[tokio::test]
    async fn render_returns_manifests() {
        let (status, body) = call(post(
            "/api/v1/jobs/render",
            json!({"template": "echo", "template_values": {"name": "Demo Job"}, "replicas": 2}),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deployment_id"], "demo-job-abcdef");
        assert_eq!(body["data"]["manifests"][1]["manifest"], "name: demo-job-abcdef-1");
    }

    #[tokio::test]
    async fn render_without_identity_value_is_bad_request() {
        let (status, body) = call(post(
            "/api/v1/jobs/render",
            json!({"template": "echo", "template_values": {}}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_template_defaults_are_not_found() {
        let (status, _) = call(get_req("/api/v1/jobs/templates/missing/defaults")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_falls_back_to_404() {
        let response = app().oneshot(get_req("/api/v2/nothing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
