use anyhow::Result;
use kube::Client;
use tracing::debug;

/// Creates a Kubernetes client configured for in-cluster or local development.
///
/// `Client::try_default` reads the service account when running as a pod and
/// falls back to the local kubeconfig otherwise.
pub async fn build_kube_client() -> Result<Client> {
    let client = Client::try_default().await?;

    debug!("Kubernetes client initialized successfully");
    Ok(client)
}
