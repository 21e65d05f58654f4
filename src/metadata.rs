//! Component metadata produced by the out-of-process extractor.
//!
//! The extractor introspects component classes and emits a JSON document;
//! this module deserializes that document and exposes a read-only
//! [`ComponentRegistry`] the providers resolve cursor identifiers against.
//! The registry never fetches or watches anything itself.

use once_cell::sync::OnceCell;
use rapidhash::fast::RandomState;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read metadata document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse metadata document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A component field: completable as an attribute name in component tags.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single parameter of a component method.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// Where a component or method is defined, as reported by the extractor.
/// `line` is 1-based.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// A component method: completable as a handler name in `on` tags.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodDef {
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub parameters: Vec<ParamDef>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
}

/// A named insertion point in a component's output.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotDef {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub doc: Option<String>,
}

/// An entry in the global event-modifier registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModifierDef {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub has_argument: bool,
}

/// Everything the extractor knows about one component class.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default)]
    pub fqn: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDef>,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDef>,
}

/// The extractor's top-level JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub modifiers: BTreeMap<String, ModifierDef>,
}

/// Read-only lookup over the metadata document.
///
/// Components resolve by simple name first, then fully-qualified name, then
/// the `app.Name` form.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentDef>,
    by_name: HashMap<String, usize, RandomState>,
    by_fqn: HashMap<String, usize, RandomState>,
    by_app_name: HashMap<String, usize, RandomState>,
    modifiers: BTreeMap<String, ModifierDef>,
    slot_union: OnceCell<Vec<(String, SlotDef)>>,
}

impl ComponentRegistry {
    pub fn from_document(document: MetadataDocument) -> Self {
        let mut by_name = HashMap::with_hasher(RandomState::new());
        let mut by_fqn = HashMap::with_hasher(RandomState::new());
        let mut by_app_name = HashMap::with_hasher(RandomState::new());
        for (index, component) in document.components.iter().enumerate() {
            by_name.entry(component.name.clone()).or_insert(index);
            if let Some(fqn) = &component.fqn {
                by_fqn.entry(fqn.clone()).or_insert(index);
            }
            if let Some(app) = &component.app {
                by_app_name
                    .entry(format!("{app}.{}", component.name))
                    .or_insert(index);
            }
        }
        Self {
            components: document.components,
            by_name,
            by_fqn,
            by_app_name,
            modifiers: document.modifiers,
            slot_union: OnceCell::new(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, MetadataError> {
        let document: MetadataDocument = serde_json::from_str(text)?;
        Ok(Self::from_document(document))
    }

    pub fn load_file(path: &Path) -> Result<Self, MetadataError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Resolve a component by any of its lookup keys.
    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        let index = self
            .by_name
            .get(name)
            .or_else(|| self.by_fqn.get(name))
            .or_else(|| self.by_app_name.get(name))?;
        self.components.get(*index)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentDef> {
        self.components.iter()
    }

    pub fn modifier(&self, name: &str) -> Option<&ModifierDef> {
        self.modifiers.get(name)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = (&str, &ModifierDef)> {
        self.modifiers
            .iter()
            .map(|(name, def)| (name.as_str(), def))
    }

    /// The deduplicated union of slot names across all components, used for
    /// `render_slot` completions which carry no component association.
    pub fn all_slots(&self) -> &[(String, SlotDef)] {
        self.slot_union.get_or_init(|| {
            let mut merged: BTreeMap<String, SlotDef> = BTreeMap::new();
            for component in &self.components {
                for (name, slot) in &component.slots {
                    merged.entry(name.clone()).or_insert_with(|| slot.clone());
                }
            }
            merged.into_iter().collect()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.modifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}

impl FieldDef {
    /// Render a `name: type = default` signature line.
    pub fn signature(&self, name: &str) -> String {
        let mut text = name.to_string();
        if let Some(ty) = &self.ty {
            let _ = write!(text, ": {ty}");
        }
        if let Some(default) = &self.default {
            let _ = write!(text, " = {default}");
        }
        if self.required {
            text.push_str(" (required)");
        }
        text
    }
}

impl MethodDef {
    /// Render an `async name(param: type = default, ...)` signature line.
    pub fn signature(&self, name: &str) -> String {
        let mut text = String::new();
        if self.is_async {
            text.push_str("async ");
        }
        text.push_str(name);
        text.push('(');
        for (index, param) in self.parameters.iter().enumerate() {
            if index > 0 {
                text.push_str(", ");
            }
            text.push_str(&param.name);
            if let Some(ty) = &param.ty {
                let _ = write!(text, ": {ty}");
            }
            if let Some(default) = &param.default {
                let _ = write!(text, " = {default}");
            }
        }
        text.push(')');
        text
    }
}

impl SlotDef {
    pub fn signature(&self, name: &str) -> String {
        if self.required {
            format!("slot '{name}' (required)")
        } else {
            format!("slot '{name}'")
        }
    }
}
