use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use kube_watcher_core::app_state::build_app_state;
use kube_watcher_core::core::client::cluster_api::KubeClusterApi;
use kube_watcher_core::core::client::kube_client::build_kube_client;
use kube_watcher_core::core::client::prometheus::PrometheusClient;
use kube_watcher_core::core::config::AppConfig;
use kube_watcher_core::core::logging::init_tracing;
use kube_watcher_core::core::template_store::FsTemplateStore;
use kube_watcher_core::domain::template::engine::TemplateEngine;
use kube_watcher_core::routes::app_router;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(&config);

    let kube = build_kube_client().await?;
    let cluster_api = Arc::new(KubeClusterApi::new(kube));
    let metrics_api = Arc::new(PrometheusClient::new(&config.prometheus_url)?);
    info!("Metrics API at {}", metrics_api.base_url());

    let store = FsTemplateStore::new(config.templates_dir.clone());
    info!("Loading job templates from {}", store.root().display());
    let engine = Arc::new(TemplateEngine::new(Arc::new(store)));

    let state = build_app_state(&config, cluster_api, metrics_api, engine);
    let app = app_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
