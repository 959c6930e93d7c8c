//! Game definition loading and class resolution

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::GdClass;
use crate::error::{IgdeError, Result};

/// On-disk form of a game definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct GameDefinitionFile {
    default_model_path: String,
    error_skin_path: String,
    classes: Vec<GdClass>,
}

/// Set of object classes with inheritance resolved
#[derive(Debug, Clone, Default)]
pub struct GameDefinition {
    classes: Vec<Arc<GdClass>>,
    default_model_path: String,
    error_skin_path: String,
}

impl GameDefinition {
    /// Create an empty game definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a game definition resolving inheritance by class name
    pub fn from_classes(classes: Vec<GdClass>) -> Self {
        Self {
            classes: resolve_classes(classes),
            ..Self::default()
        }
    }

    pub fn with_default_model_path(mut self, path: impl Into<String>) -> Self {
        self.default_model_path = path.into();
        self
    }

    pub fn with_error_skin_path(mut self, path: impl Into<String>) -> Self {
        self.error_skin_path = path.into();
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: GameDefinitionFile =
            toml::from_str(content).map_err(|e| IgdeError::Config(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: GameDefinitionFile =
            serde_json::from_str(content).map_err(|e| IgdeError::Config(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    /// Load a game definition from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let definition = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            _ => {
                return Err(IgdeError::Config(format!(
                    "unsupported game definition format: {}",
                    path.display()
                )))
            }
        };

        log::info!(
            "Loaded game definition {} with {} classes",
            path.display(),
            definition.classes.len()
        );
        Ok(definition)
    }

    fn from_file(file: GameDefinitionFile) -> Self {
        Self::from_classes(file.classes)
            .with_default_model_path(file.default_model_path)
            .with_error_skin_path(file.error_skin_path)
    }

    pub fn classes(&self) -> &[Arc<GdClass>] {
        &self.classes
    }

    pub fn class_named(&self, name: &str) -> Option<Arc<GdClass>> {
        self.classes.iter().find(|c| c.name == name).cloned()
    }

    /// Model used by components without a loadable model
    pub fn default_model_path(&self) -> &str {
        &self.default_model_path
    }

    /// Skin used by components whose skin failed to load
    pub fn error_skin_path(&self) -> &str {
        &self.error_skin_path
    }
}

fn resolve_classes(classes: Vec<GdClass>) -> Vec<Arc<GdClass>> {
    let mut order = Vec::with_capacity(classes.len());
    let mut raw: HashMap<String, GdClass> = HashMap::with_capacity(classes.len());

    for class in classes {
        if raw.contains_key(&class.name) {
            log::warn!("Duplicate class '{}' ignored", class.name);
            continue;
        }
        order.push(class.name.clone());
        raw.insert(class.name.clone(), class);
    }

    let mut resolved = HashMap::with_capacity(raw.len());
    let mut visiting = HashSet::new();

    order
        .iter()
        .filter_map(|name| resolve_class(name, &raw, &mut resolved, &mut visiting))
        .collect()
}

fn resolve_class(
    name: &str,
    raw: &HashMap<String, GdClass>,
    resolved: &mut HashMap<String, Arc<GdClass>>,
    visiting: &mut HashSet<String>,
) -> Option<Arc<GdClass>> {
    if let Some(class) = resolved.get(name) {
        return Some(class.clone());
    }

    let Some(class) = raw.get(name) else {
        log::warn!("Inherited class '{}' not found", name);
        return None;
    };

    if !visiting.insert(name.to_string()) {
        log::warn!("Cyclic inheritance through class '{}'", name);
        return None;
    }

    let mut class = class.clone();
    for inherit in &mut class.inherits {
        inherit.class = resolve_class(&inherit.name, raw, resolved, visiting);
    }

    visiting.remove(name);
    let class = Arc::new(class);
    resolved.insert(name.to_string(), class.clone());
    Some(class)
}
