use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::client::kube_resources::{IntOrString, ObjectMeta, Service, ServicePort, ServiceSpec};
use crate::core::template_store::{validate_template_name, TemplateStore};
use crate::domain::template::definition::{FieldSpec, TemplateDefinition};
use crate::domain::template::identity::{
    assign_identities, parse_ports, DeploymentIdentity, JobLabel, SuffixSource, UuidSuffix,
};
use crate::domain::template::selector::{LabelsOperator, NodeSelectorSpec};
use crate::domain::template::value::{DeploymentValues, Value};
use crate::errors::{internal_error, AppError};

pub const CUSTOM_TEMPLATE_ID: &str = "custom";
pub const ENDPOINT_PORTS_KEY: &str = "endpoint_ports";
pub const DEPLOYMENT_ID_KEY: &str = "deployment_id";
pub const JOB_NAME_KEY: &str = "job_name";
pub const NODE_SELECTORS_KEY: &str = "NODE_SELECTORS";
pub const PRIORITY_CLASS_KEY: &str = "PRIORITY_CLASS";
pub const LEADER_ROLE: &str = "leader";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRef {
    Named(String),
    Inline { body: String, defaults_yaml: String },
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub template: TemplateRef,
    pub values: DeploymentValues,
    pub target_labels: Option<BTreeMap<String, Value>>,
    pub labels_operator: LabelsOperator,
    pub replicas: u32,
    pub random_suffix: bool,
    pub priority: Option<String>,
}

impl RenderRequest {
    pub fn new(template: TemplateRef, values: DeploymentValues) -> Self {
        Self {
            template,
            values,
            target_labels: None,
            labels_operator: LabelsOperator::default(),
            replicas: 1,
            random_suffix: true,
            priority: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedManifest {
    pub job_name: String,
    pub label: JobLabel,
    pub ports: Vec<u16>,
    pub manifest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub deployment_id: String,
    pub manifests: Vec<RenderedManifest>,
    /// NodePort service fronting the leader, present when ports were requested.
    pub service: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDefaults {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub metadata: Option<serde_json::Value>,
}

pub struct TemplateEngine {
    store: Arc<dyn TemplateStore>,
    suffixes: Arc<dyn SuffixSource>,
}

impl TemplateEngine {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_suffix_source(store, Arc::new(UuidSuffix))
    }

    pub fn with_suffix_source(store: Arc<dyn TemplateStore>, suffixes: Arc<dyn SuffixSource>) -> Self {
        Self { store, suffixes }
    }

    pub fn list_templates(&self) -> Result<Vec<String>, AppError> {
        self.store.list()
    }

    pub fn template_defaults(&self, name: &str) -> Result<TemplateDefaults, AppError> {
        let source = self.store.load(name)?;
        let definition = TemplateDefinition::new(name, &source.body, &source.defaults_yaml)?;
        Ok(TemplateDefaults {
            name: name.to_string(),
            fields: definition.fields,
            metadata: source.metadata,
        })
    }

    pub fn load(&self, template: &TemplateRef) -> Result<TemplateDefinition, AppError> {
        match template {
            TemplateRef::Named(name) => {
                validate_template_name(name)?;
                let source = self.store.load(name)?;
                TemplateDefinition::new(name, &source.body, &source.defaults_yaml)
            }
            TemplateRef::Inline { body, defaults_yaml } => {
                TemplateDefinition::new(CUSTOM_TEMPLATE_ID, body, defaults_yaml)
            }
        }
    }

    /// Render one manifest per replica. The template is compiled once and
    /// every replica shares the same random suffix, so they group under one
    /// job label.
    pub fn render(&self, req: &RenderRequest) -> Result<RenderOutput, AppError> {
        let definition = self.load(&req.template)?;
        let merged = definition.merge_defaults(&req.values);

        let id_key = definition.id_field().ok_or_else(|| {
            AppError::TemplateError(format!(
                "Template '{}' does not declare an identity field",
                definition.template_id
            ))
        })?;
        let raw_name = req
            .values
            .get(&id_key)
            .filter(|v| !v.is_none())
            .and(merged.get(&id_key))
            .ok_or_else(|| AppError::ValidationError(format!("Key value '{}' missing from values", id_key)))?
            .to_string();

        let ports = parse_ports(merged.get(ENDPOINT_PORTS_KEY))?;
        let suffix = req.random_suffix.then(|| self.suffixes.suffix());
        let identities = assign_identities(&raw_name, suffix.as_deref(), req.replicas, &ports)?;

        let selector = req
            .target_labels
            .as_ref()
            .and_then(|labels| NodeSelectorSpec::from_target_labels(labels, req.labels_operator));

        let env = Environment::new();
        let template = env.template_from_str(&definition.body)?;

        let mut manifests = Vec::with_capacity(identities.len());
        for identity in &identities {
            let ctx = render_context(&merged, identity, req.replicas, selector.as_ref(), req.priority.as_deref());
            let manifest = template.render(&ctx)?;
            debug!("Rendered manifest for {}", identity.job_name);
            manifests.push(RenderedManifest {
                job_name: identity.job_name.clone(),
                label: identity.label.clone(),
                ports: identity.ports.clone(),
                manifest,
            });
        }

        // every identity carries the same group label
        let group = identities
            .first()
            .ok_or_else(|| AppError::ValidationError("replicas must be at least 1".to_string()))?;
        let service = service_manifest(group)?;

        info!(
            "Rendered {} manifest(s) from template '{}' as deployment {}",
            manifests.len(),
            definition.template_id,
            group.label.value
        );

        Ok(RenderOutput {
            deployment_id: group.label.value.clone(),
            manifests,
            service,
        })
    }
}

fn render_context(
    merged: &DeploymentValues,
    identity: &DeploymentIdentity,
    replicas: u32,
    selector: Option<&NodeSelectorSpec>,
    priority: Option<&str>,
) -> BTreeMap<String, minijinja::Value> {
    let mut ctx: BTreeMap<String, minijinja::Value> = merged
        .iter()
        .map(|(k, v)| (k.clone(), minijinja::Value::from_serialize(v)))
        .collect();

    ctx.insert(DEPLOYMENT_ID_KEY.into(), minijinja::Value::from(identity.label.value.clone()));
    ctx.insert(JOB_NAME_KEY.into(), minijinja::Value::from(identity.job_name.clone()));
    ctx.insert("job_label_key".into(), minijinja::Value::from(identity.label.key.clone()));
    ctx.insert("job_label_value".into(), minijinja::Value::from(identity.label.value.clone()));
    ctx.insert("replica_index".into(), minijinja::Value::from(identity.replica_index));
    ctx.insert("replicas".into(), minijinja::Value::from(replicas));

    if let Some(selector) = selector {
        ctx.insert(NODE_SELECTORS_KEY.into(), minijinja::Value::from_serialize(selector.to_context()));
    }
    if let Some(priority) = priority {
        ctx.insert(PRIORITY_CLASS_KEY.into(), minijinja::Value::from(priority.to_string()));
    }
    ctx
}

/// NodePort service exposing the deployment's endpoint ports on its leader.
pub fn service_manifest(identity: &DeploymentIdentity) -> Result<Option<String>, AppError> {
    if identity.ports.is_empty() {
        return Ok(None);
    }

    let label = &identity.label;
    let ports = identity
        .ports
        .iter()
        .map(|p| ServicePort {
            name: Some(format!("http-{}", p)),
            port: i32::from(*p),
            target_port: Some(IntOrString::Int(i32::from(*p))),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        })
        .collect();

    let service = Service {
        metadata: ObjectMeta {
            name: Some(format!("{}-service", label.value)),
            labels: Some(BTreeMap::from([(label.key.clone(), label.value.clone())])),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("NodePort".to_string()),
            selector: Some(BTreeMap::from([
                (label.key.clone(), label.value.clone()),
                ("role".to_string(), LEADER_ROLE.to_string()),
            ])),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    };

    serde_yaml::to_string(&service).map(Some).map_err(internal_error)
}
