use serde_json::Value;
use std::path::{Path, PathBuf};

/// Provider toggles; both default to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderConfig {
    pub enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ProviderConfig {
    fn apply_section(&mut self, value: &Value) {
        if let Some(enabled) = value.as_bool() {
            self.enabled = enabled;
            return;
        }
        if let Some(obj) = value.as_object()
            && let Some(enabled) = obj.get("enabled").and_then(Value::as_bool)
        {
            self.enabled = enabled;
        }
    }
}

/// Settings the client can supply via initialization options or
/// `workspace/didChangeConfiguration`. Parsed leniently: unknown keys are
/// ignored and sections may appear either at the top level or nested under a
/// `wireview` object.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    metadata_path: Option<PathBuf>,
    completion: ProviderConfig,
    hover: ProviderConfig,
}

impl ServerConfig {
    pub fn metadata_path(&self) -> Option<&Path> {
        self.metadata_path.as_deref()
    }

    pub fn completion_enabled(&self) -> bool {
        self.completion.enabled
    }

    pub fn hover_enabled(&self) -> bool {
        self.hover.enabled
    }

    pub fn apply_settings(&mut self, value: &Value) {
        if let Some(path) = metadata_path_from_value(value) {
            self.metadata_path = Some(path);
        }
        if let Some(section) = section(value, "completion") {
            self.completion.apply_section(section);
        }
        if let Some(section) = section(value, "hover") {
            self.hover.apply_section(section);
        }
    }
}

fn section<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(obj) = value.as_object() {
        if let Some(section) = obj.get(key) {
            return Some(section);
        }
        if let Some(root) = obj.get("wireview") {
            return section_inner(root, key);
        }
    }
    None
}

fn section_inner<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|obj| obj.get(key))
}

fn metadata_path_from_value(value: &Value) -> Option<PathBuf> {
    let obj = value.as_object()?;
    if let Some(path) = obj.get("metadataPath").and_then(Value::as_str) {
        return Some(PathBuf::from(path));
    }
    if let Some(metadata) = obj.get("metadata")
        && let Some(path) = metadata
            .as_object()
            .and_then(|section| section.get("path"))
            .and_then(Value::as_str)
    {
        return Some(PathBuf::from(path));
    }
    if let Some(root) = obj.get("wireview") {
        return metadata_path_from_value(root);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_apply_from_nested_wireview_section() {
        let mut config = ServerConfig::default();
        config.apply_settings(&json!({
            "wireview": {
                "metadataPath": "/tmp/components.json",
                "completion": {"enabled": false}
            }
        }));
        assert_eq!(
            config.metadata_path(),
            Some(Path::new("/tmp/components.json"))
        );
        assert!(!config.completion_enabled());
        assert!(config.hover_enabled(), "untouched sections keep defaults");
    }

    #[test]
    fn settings_accept_top_level_and_bool_sections() {
        let mut config = ServerConfig::default();
        config.apply_settings(&json!({
            "metadata": {"path": "meta.json"},
            "hover": false
        }));
        assert_eq!(config.metadata_path(), Some(Path::new("meta.json")));
        assert!(!config.hover_enabled());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut config = ServerConfig::default();
        config.apply_settings(&json!({"somethingElse": 42}));
        assert_eq!(config.metadata_path(), None);
        assert!(config.completion_enabled());
    }
}
