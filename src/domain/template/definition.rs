use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::template::value::{DeploymentValues, Value};
use crate::errors::AppError;

/// Legacy schema entry name whose default names the identity field.
pub const LEGACY_ID_FIELD: &str = "id_field";

fn default_editable() -> bool {
    true
}

/// One entry of a template's default-value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub default: Value,
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_id_field: bool,
}

impl FieldSpec {
    /// Identity entries are pointers: their default is the name of the value
    /// that becomes the deployment name. They never take part in merging.
    pub fn marks_identity(&self) -> bool {
        self.is_id_field || self.name == LEGACY_ID_FIELD
    }
}

#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub template_id: String,
    pub body: String,
    pub fields: Vec<FieldSpec>,
}

/// Parse a default-schema document (a YAML list of field specs).
pub fn parse_field_specs(defaults_yaml: &str) -> Result<Vec<FieldSpec>, AppError> {
    if defaults_yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let fields: Option<Vec<FieldSpec>> = serde_yaml::from_str(defaults_yaml)
        .map_err(|e| AppError::TemplateError(format!("Invalid default values schema: {}", e)))?;
    Ok(fields.unwrap_or_default())
}

impl TemplateDefinition {
    pub fn new(template_id: &str, body: &str, defaults_yaml: &str) -> Result<Self, AppError> {
        let fields = parse_field_specs(defaults_yaml)?;

        let id_fields = fields.iter().filter(|f| f.marks_identity()).count();
        if id_fields > 1 {
            return Err(AppError::TemplateError(format!(
                "Template '{}' marks {} identity fields, expected at most one",
                template_id, id_fields
            )));
        }

        Ok(Self {
            template_id: template_id.to_string(),
            body: body.to_string(),
            fields,
        })
    }

    /// Name of the caller value that seeds the deployment name.
    pub fn id_field(&self) -> Option<String> {
        self.fields
            .iter()
            .find(|f| f.marks_identity())
            .map(|f| f.default.to_string())
            .filter(|name| !name.is_empty())
    }

    /// Defaults fill in absent values; non-editable defaults replace whatever
    /// the caller sent. The caller's map is left untouched.
    pub fn merge_defaults(&self, values: &DeploymentValues) -> DeploymentValues {
        let mut merged = values.clone();

        for field in self.fields.iter().filter(|f| !f.marks_identity()) {
            match merged.get_mut(&field.name) {
                None => {
                    merged.insert(field.name.clone(), field.default.clone());
                }
                Some(current) if !field.editable => {
                    if *current != field.default {
                        warn!("Removing non editable field [{}] from request values", field.name);
                    }
                    *current = field.default.clone();
                }
                Some(_) => {}
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
- name: id_field
  default: model_id
- name: model_id
  default: null
  description: Hugging Face model to serve
- name: ram
  default: 4Gi
  editable: false
- name: cpus
  default: 2
- name: gpu_fraction
  default: 0.5
"#;

    fn definition() -> TemplateDefinition {
        TemplateDefinition::new("vllm", "body", SCHEMA).unwrap()
    }

    #[test]
    fn parses_schema_with_legacy_identity_entry() {
        let def = definition();
        assert_eq!(def.fields.len(), 5);
        assert_eq!(def.id_field().as_deref(), Some("model_id"));
        assert!(!def.fields[2].editable);
        assert!(def.fields[3].editable);
        assert_eq!(def.fields[4].default, Value::Float(0.5));
    }

    #[test]
    fn is_id_field_flag_also_marks_identity() {
        let def = TemplateDefinition::new(
            "custom",
            "body",
            "- name: deployment_name\n  default: name_field\n  is_id_field: true\n",
        )
        .unwrap();
        assert_eq!(def.id_field().as_deref(), Some("name_field"));
    }

    #[test]
    fn rejects_two_identity_fields() {
        let schema = "- name: id_field\n  default: a\n- name: other\n  default: b\n  is_id_field: true\n";
        assert!(matches!(
            TemplateDefinition::new("bad", "body", schema),
            Err(AppError::TemplateError(_))
        ));
    }

    #[test]
    fn malformed_schema_is_a_template_error() {
        assert!(matches!(parse_field_specs("name: [unclosed"), Err(AppError::TemplateError(_))));
        assert!(parse_field_specs("").unwrap().is_empty());
    }

    #[test]
    fn non_editable_default_overrides_caller_value() {
        let values = DeploymentValues::from([
            ("model_id".to_string(), Value::from("qwen")),
            ("ram".to_string(), Value::from("64Gi")),
            ("cpus".to_string(), Value::Int(8)),
        ]);

        let merged = definition().merge_defaults(&values);

        assert_eq!(merged["ram"], Value::from("4Gi"));
        assert_eq!(merged["cpus"], Value::Int(8));
        assert_eq!(merged["gpu_fraction"], Value::Float(0.5));
        assert!(!merged.contains_key(LEGACY_ID_FIELD));
        // caller's copy is untouched
        assert_eq!(values["ram"], Value::from("64Gi"));
    }
}
