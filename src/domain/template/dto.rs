use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::template::engine::{RenderRequest, TemplateRef};
use crate::domain::template::selector::LabelsOperator;
use crate::domain::template::value::{DeploymentValues, Value};

fn default_replicas() -> u32 {
    1
}

fn default_random_suffix() -> bool {
    true
}

/// Options shared by named and custom job renders.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenderOptions {
    #[serde(default)]
    pub template_values: DeploymentValues,
    #[serde(default)]
    pub target_labels: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub target_labels_ops: LabelsOperator,
    #[serde(default = "default_replicas")]
    #[validate(range(min = 1, max = 1000))]
    pub replicas: u32,
    #[serde(default = "default_random_suffix")]
    pub random_suffix: bool,
    #[serde(default)]
    pub priority: Option<String>,
}

impl RenderOptions {
    fn into_request(self, template: TemplateRef) -> RenderRequest {
        RenderRequest {
            template,
            values: self.template_values,
            target_labels: self.target_labels,
            labels_operator: self.target_labels_ops,
            replicas: self.replicas,
            random_suffix: self.random_suffix,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenderJobRequest {
    #[validate(length(min = 1))]
    pub template: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub options: RenderOptions,
}

impl From<RenderJobRequest> for RenderRequest {
    fn from(req: RenderJobRequest) -> Self {
        req.options.into_request(TemplateRef::Named(req.template))
    }
}

/// Ad-hoc job: the template body and its default schema (YAML) come inline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenderCustomJobRequest {
    #[validate(length(min = 1))]
    pub template: String,
    #[serde(default)]
    pub default_values: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub options: RenderOptions,
}

impl From<RenderCustomJobRequest> for RenderRequest {
    fn from(req: RenderCustomJobRequest) -> Self {
        req.options.into_request(TemplateRef::Inline {
            body: req.template,
            defaults_yaml: req.default_values,
        })
    }
}
