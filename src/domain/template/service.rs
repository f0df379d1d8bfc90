use std::sync::Arc;

use validator::Validate;

use crate::domain::template::dto::{RenderCustomJobRequest, RenderJobRequest};
use crate::domain::template::engine::{RenderOutput, RenderRequest, TemplateDefaults, TemplateEngine};
use crate::errors::{internal_error, AppError};

/// Template loading touches the filesystem, so it runs off the async workers.
async fn blocking<T, F>(engine: &Arc<TemplateEngine>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&TemplateEngine) -> Result<T, AppError> + Send + 'static,
{
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(internal_error)?
}

pub async fn list_templates(engine: &Arc<TemplateEngine>) -> Result<Vec<String>, AppError> {
    blocking(engine, |e| e.list_templates()).await
}

pub async fn get_template_defaults(engine: &Arc<TemplateEngine>, name: String) -> Result<TemplateDefaults, AppError> {
    blocking(engine, move |e| e.template_defaults(&name)).await
}

pub async fn render_job(engine: &Arc<TemplateEngine>, req: RenderJobRequest) -> Result<RenderOutput, AppError> {
    req.validate()?;
    let request: RenderRequest = req.into();
    blocking(engine, move |e| e.render(&request)).await
}

pub async fn render_custom_job(
    engine: &Arc<TemplateEngine>,
    req: RenderCustomJobRequest,
) -> Result<RenderOutput, AppError> {
    req.validate()?;
    let request: RenderRequest = req.into();
    blocking(engine, move |e| e.render(&request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template_store::InMemoryTemplateStore;
    use crate::domain::template::dto::RenderOptions;
    use crate::domain::template::identity::FixedSuffix;
    use crate::domain::template::value::{DeploymentValues, Value};

    fn engine() -> Arc<TemplateEngine> {
        let store = InMemoryTemplateStore::new().with_template(
            "echo",
            "name: {{ job_name }}\nram: {{ ram }}",
            "- name: id_field\n  default: name\n- name: ram\n  default: 4Gi\n  editable: false\n",
        );
        Arc::new(TemplateEngine::with_suffix_source(
            Arc::new(store),
            Arc::new(FixedSuffix("zzz999".into())),
        ))
    }

    fn options(values: &[(&str, &str)]) -> RenderOptions {
        RenderOptions {
            template_values: values
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect::<DeploymentValues>(),
            target_labels: None,
            target_labels_ops: Default::default(),
            replicas: 1,
            random_suffix: true,
            priority: None,
        }
    }

    #[tokio::test]
    async fn renders_named_job() {
        let req = RenderJobRequest {
            template: "echo".into(),
            options: options(&[("name", "Demo"), ("ram", "64Gi")]),
        };

        let out = render_job(&engine(), req).await.unwrap();
        assert_eq!(out.manifests[0].manifest, "name: demo-zzz999\nram: 4Gi");
    }

    #[tokio::test]
    async fn custom_job_with_broken_schema_is_a_template_error() {
        let req = RenderCustomJobRequest {
            template: "name: {{ job_name }}".into(),
            default_values: "- name: [".into(),
            options: options(&[("name", "demo")]),
        };

        let err = render_custom_job(&engine(), req).await.unwrap_err();
        assert!(matches!(err, AppError::TemplateError(_)));
    }

    #[tokio::test]
    async fn lists_templates_and_defaults() {
        let engine = engine();
        assert_eq!(list_templates(&engine).await.unwrap(), vec!["echo"]);

        let defaults = get_template_defaults(&engine, "echo".into()).await.unwrap();
        assert_eq!(defaults.fields.len(), 2);
    }
}
