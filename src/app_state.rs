use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::client::cluster_api::ClusterApi;
use crate::core::client::prometheus::MetricsApi;
use crate::core::config::AppConfig;
use crate::domain::cluster::dto::{NodeFilterRequest, NodesWithLabelsRequest, PodsWithStatusRequest};
use crate::domain::cluster::model::{
    ClusterResourceTotals, NodeFilter, NodeGpuInventory, NodeResources, PodStatusEntry,
    ResourceSource, ResourceTotals, UnschedulablePod,
};
use crate::domain::cluster::service as cluster;
use crate::domain::template::dto::{RenderCustomJobRequest, RenderJobRequest};
use crate::domain::template::engine::{RenderOutput, TemplateDefaults, TemplateEngine};
use crate::domain::template::service as jobs;
use crate::domain::usage::dto::{ComputeUsageRequest, NodeUptimeRequest};
use crate::domain::usage::model::ResourceHours;
use crate::domain::usage::service as usage;
use crate::errors::AppError;

type NodeMap<T> = BTreeMap<String, T>;

#[derive(Clone)]
pub struct AppState {
    pub cluster_service: Arc<ClusterService>,
    pub usage_service: Arc<UsageService>,
    pub job_service: Arc<JobService>,
}

pub fn build_app_state(
    config: &AppConfig,
    cluster_api: Arc<dyn ClusterApi>,
    metrics_api: Arc<dyn MetricsApi>,
    engine: Arc<TemplateEngine>,
) -> AppState {
    AppState {
        cluster_service: Arc::new(ClusterService {
            api: cluster_api,
            gpu_annotation: config.gpu_annotation.clone(),
        }),
        usage_service: Arc::new(UsageService {
            api: metrics_api,
            default_step_seconds: config.usage_step_seconds,
        }),
        job_service: Arc::new(JobService { engine }),
    }
}

pub struct ClusterService {
    api: Arc<dyn ClusterApi>,
    gpu_annotation: String,
}

impl ClusterService {
    pub async fn total_resources(
        &self,
        filter: NodeFilter,
        source: Option<ResourceSource>,
    ) -> Result<ClusterResourceTotals, AppError> {
        cluster::compute_cluster_totals(self.api.as_ref(), &filter, source.unwrap_or_default()).await
    }

    pub async fn available_resources(&self, filter: NodeFilter) -> Result<ResourceTotals, AppError> {
        cluster::compute_available_resources(self.api.as_ref(), &filter).await
    }

    pub async fn cluster_labels(&self) -> Result<ClusterResourceTotals, AppError> {
        cluster::get_cluster_labels(self.api.as_ref()).await
    }

    pub async fn node_labels(&self, req: NodeFilterRequest) -> Result<NodeMap<BTreeMap<String, String>>, AppError> {
        cluster::get_node_labels(self.api.as_ref(), req).await
    }

    pub async fn nodes_with_labels(&self, req: NodesWithLabelsRequest) -> Result<Vec<String>, AppError> {
        cluster::get_nodes_with_labels(self.api.as_ref(), req).await
    }

    pub async fn node_gpus(&self, req: NodeFilterRequest) -> Result<NodeMap<NodeGpuInventory>, AppError> {
        cluster::get_gpu_inventory(self.api.as_ref(), req, &self.gpu_annotation).await
    }

    pub async fn node_resources(&self, req: NodeFilterRequest) -> Result<NodeMap<NodeResources>, AppError> {
        cluster::get_node_resources(self.api.as_ref(), req).await
    }

    pub async fn node_conditions(&self, conditions: Option<Vec<String>>) -> Result<NodeMap<BTreeMap<String, bool>>, AppError> {
        cluster::get_node_conditions(self.api.as_ref(), conditions).await
    }

    pub async fn nodes_with_pressure(&self, pressures: Option<Vec<String>>) -> Result<NodeMap<BTreeMap<String, bool>>, AppError> {
        cluster::get_nodes_with_pressure(self.api.as_ref(), pressures).await
    }

    pub async fn pods_with_status(&self, req: PodsWithStatusRequest) -> Result<Vec<PodStatusEntry>, AppError> {
        cluster::get_pods_with_status(self.api.as_ref(), req).await
    }

    pub async fn unschedulable_pods(&self) -> Result<BTreeMap<String, UnschedulablePod>, AppError> {
        cluster::get_unschedulable_pods(self.api.as_ref()).await
    }
}

pub struct UsageService {
    api: Arc<dyn MetricsApi>,
    default_step_seconds: u64,
}

impl UsageService {
    pub async fn compute_hours(&self, req: ComputeUsageRequest) -> Result<ResourceHours, AppError> {
        usage::compute_usage_hours(self.api.as_ref(), req, self.default_step_seconds).await
    }

    pub async fn node_uptime(&self, req: NodeUptimeRequest) -> Result<NodeMap<f64>, AppError> {
        usage::compute_node_uptime(self.api.as_ref(), req, self.default_step_seconds).await
    }
}

pub struct JobService {
    engine: Arc<TemplateEngine>,
}

impl JobService {
    pub async fn list_templates(&self) -> Result<Vec<String>, AppError> {
        jobs::list_templates(&self.engine).await
    }

    pub async fn template_defaults(&self, name: String) -> Result<TemplateDefaults, AppError> {
        jobs::get_template_defaults(&self.engine, name).await
    }

    pub async fn render(&self, req: RenderJobRequest) -> Result<RenderOutput, AppError> {
        jobs::render_job(&self.engine, req).await
    }

    pub async fn render_custom(&self, req: RenderCustomJobRequest) -> Result<RenderOutput, AppError> {
        jobs::render_custom_job(&self.engine, req).await
    }
}
