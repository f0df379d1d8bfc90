use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::AppError;

const TEMPLATE_FILE: &str = "template.yaml";
const DEFAULTS_FILE: &str = "values.yaml";
const METADATA_FILE: &str = "metadata.json";

/// Raw documents behind one named job template.
#[derive(Debug, Clone, Default)]
pub struct TemplateSource {
    pub body: String,
    pub defaults_yaml: String,
    pub metadata: Option<serde_json::Value>,
}

/// Where named templates come from.
pub trait TemplateStore: Send + Sync {
    fn list(&self) -> Result<Vec<String>, AppError>;
    fn load(&self, name: &str) -> Result<TemplateSource, AppError>;
}

/// Template names double as directory names, so only `[a-z0-9_-]` is allowed.
pub fn validate_template_name(name: &str) -> Result<(), AppError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("Invalid template name '{}'", name)))
    }
}

/// Templates laid out as `<root>/<name>/{template.yaml,values.yaml,metadata.json}`.
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_required(path: &Path, name: &str) -> Result<String, AppError> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Template '{}' has no {}", name, path.display()))
            } else {
                AppError::InternalServerError(format!("Failed to read {}: {}", path.display(), e))
            }
        })
    }

    fn read_metadata(path: &Path) -> Option<serde_json::Value> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring malformed template metadata {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl TemplateStore for FsTemplateStore {
    fn list(&self) -> Result<Vec<String>, AppError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to read templates dir {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(TEMPLATE_FILE).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_template_name(name).is_ok())
            .collect();
        names.sort();

        debug!("Found {} template(s) under {}", names.len(), self.root.display());
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<TemplateSource, AppError> {
        validate_template_name(name)?;

        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(AppError::NotFound(format!("Template '{}' not found", name)));
        }

        Ok(TemplateSource {
            body: Self::read_required(&dir.join(TEMPLATE_FILE), name)?,
            defaults_yaml: Self::read_required(&dir.join(DEFAULTS_FILE), name)?,
            metadata: Self::read_metadata(&dir.join(METADATA_FILE)),
        })
    }
}

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: BTreeMap<String, TemplateSource>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: &str, body: &str, defaults_yaml: &str) -> Self {
        self.templates.insert(
            name.to_string(),
            TemplateSource {
                body: body.to_string(),
                defaults_yaml: defaults_yaml.to_string(),
                metadata: None,
            },
        );
        self
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn list(&self) -> Result<Vec<String>, AppError> {
        Ok(self.templates.keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<TemplateSource, AppError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Template '{}' not found", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_template(root: &Path, name: &str, metadata: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TEMPLATE_FILE), "kind: Pod\nmetadata:\n  name: {{ job_name }}\n").unwrap();
        fs::write(dir.join(DEFAULTS_FILE), "- name: cpus\n  default: 1\n").unwrap();
        if let Some(meta) = metadata {
            fs::write(dir.join(METADATA_FILE), meta).unwrap();
        }
    }

    #[test]
    fn lists_only_directories_with_a_template() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "vllm", None);
        write_template(tmp.path(), "llamacpp", None);
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let store = FsTemplateStore::new(tmp.path());
        assert_eq!(store.list().unwrap(), vec!["llamacpp", "vllm"]);
    }

    #[test]
    fn loads_body_defaults_and_metadata() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "vllm", Some(r#"{"description": "vLLM server"}"#));

        let source = FsTemplateStore::new(tmp.path()).load("vllm").unwrap();

        assert!(source.body.contains("{{ job_name }}"));
        assert!(source.defaults_yaml.contains("cpus"));
        assert_eq!(source.metadata.unwrap()["description"], "vLLM server");
    }

    #[test]
    fn malformed_metadata_is_ignored() {
        let tmp = TempDir::new().unwrap();
        write_template(tmp.path(), "vllm", Some("{not json"));

        let source = FsTemplateStore::new(tmp.path()).load("vllm").unwrap();
        assert!(source.metadata.is_none());
    }

    #[test]
    fn rejects_path_traversal_and_unknown_names() {
        let tmp = TempDir::new().unwrap();
        let store = FsTemplateStore::new(tmp.path());

        assert!(matches!(store.load("../etc"), Err(AppError::ValidationError(_))));
        assert!(matches!(store.load("Vllm"), Err(AppError::ValidationError(_))));
        assert!(matches!(store.load("missing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryTemplateStore::new().with_template("custom", "body", "[]");
        assert_eq!(store.list().unwrap(), vec!["custom"]);
        assert_eq!(store.load("custom").unwrap().body, "body");
        assert!(matches!(store.load("other"), Err(AppError::NotFound(_))));
    }
}
