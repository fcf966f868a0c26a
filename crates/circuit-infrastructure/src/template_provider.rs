//! TemplateProvider implementations.

use async_trait::async_trait;
use circuit_core::error::{CircuitError, Result};
use circuit_core::template::{Template, TemplateProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tokio::task;

/// Templates held in memory, keyed by ID.
#[derive(Debug, Default)]
pub struct InMemoryTemplateProvider {
    templates: RwLock<HashMap<String, Template>>,
}

impl InMemoryTemplateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let templates = templates.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template. Sessions already started keep their snapshot.
    pub async fn upsert(&self, template: Template) {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
    }

    pub async fn remove(&self, template_id: &str) -> Option<Template> {
        self.templates.write().await.remove(template_id)
    }
}

#[async_trait]
impl TemplateProvider for InMemoryTemplateProvider {
    async fn get_template(&self, template_id: &str) -> Result<Option<Template>> {
        Ok(self.templates.read().await.get(template_id).cloned())
    }
}

/// Reads templates from `<templates_dir>/<id>.toml`.
///
/// ```toml
/// name = "Monday Strength"
///
/// [[blocks]]
/// name = "Warm-up"
///
/// [[blocks.steps]]
/// title = "Jumping jacks"
/// step_kind = "time"
/// duration_ms = 30000
/// ```
///
/// The `id` key may be omitted; the file stem is used instead.
#[derive(Debug, Clone)]
pub struct TomlTemplateProvider {
    templates_dir: PathBuf,
}

impl TomlTemplateProvider {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Parses a template file. Also used for ad-hoc `--file` starts.
    pub fn load_file(path: &Path) -> Result<Option<Template>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CircuitError::io(format!(
                    "Failed to read template '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut template: Template = toml::from_str(&content).map_err(|e| {
            CircuitError::InvalidTemplate(format!("{}: {}", path.display(), e))
        })?;

        if template.id.is_empty()
            && let Some(stem) = path.file_stem()
        {
            template.id = stem.to_string_lossy().into_owned();
        }

        Ok(Some(template))
    }
}

#[async_trait]
impl TemplateProvider for TomlTemplateProvider {
    async fn get_template(&self, template_id: &str) -> Result<Option<Template>> {
        if template_id.contains(['/', '\\']) || template_id.starts_with('.') {
            return Ok(None);
        }
        let path = self.templates_dir.join(format!("{}.toml", template_id));

        task::spawn_blocking(move || Self::load_file(&path))
            .await
            .map_err(|e| CircuitError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}
