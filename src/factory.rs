//! Building adapters from configuration.
//!
//! ```toml
//! adapter = "apcu"
//!
//! [options]
//! prefix = "app"
//! lifetime = 3600
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::adapter::{Adapter, AdapterOptions};
use crate::error::{AnnotationsError, Result};

/// Builds an adapter from its options.
pub type AdapterConstructor = fn(&AdapterOptions) -> Adapter;

/// `{ adapter, options }` as found in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationsConfig {
    #[serde(default)]
    pub adapter: Option<String>,
    /// Backend options, read leniently by [`AdapterOptions::from_value`].
    #[serde(default)]
    pub options: JsonValue,
}

impl AnnotationsConfig {
    /// Pick the fields out of an arbitrary JSON value; anything that is
    /// not an object has no adapter.
    pub fn from_value(value: &JsonValue) -> Self {
        AnnotationsConfig {
            adapter: value
                .get("adapter")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            options: value.get("options").cloned().unwrap_or(JsonValue::Null),
        }
    }
}

/// Registry of named adapter constructors.
#[derive(Debug, Clone)]
pub struct AnnotationsFactory {
    services: HashMap<String, AdapterConstructor>,
}

impl Default for AnnotationsFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationsFactory {
    /// A factory knowing `"memory"` and `"apcu"`.
    pub fn new() -> Self {
        let mut services: HashMap<String, AdapterConstructor> = HashMap::new();
        services.insert("memory".to_string(), |_| Adapter::memory());
        services.insert("apcu".to_string(), Adapter::apcu);
        AnnotationsFactory { services }
    }

    /// Add constructors, replacing built-in ones of the same name.
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = (S, AdapterConstructor)>,
        S: Into<String>,
    {
        self.services
            .extend(services.into_iter().map(|(name, ctor)| (name.into(), ctor)));
        self
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Build the adapter a JSON configuration names.
    pub fn load(&self, config: &JsonValue) -> Result<Adapter> {
        self.load_config(&AnnotationsConfig::from_value(config))
    }

    pub fn load_config(&self, config: &AnnotationsConfig) -> Result<Adapter> {
        let Some(name) = config.adapter.as_deref() else {
            return Err(AnnotationsError::config(
                "You must provide 'adapter' option in factory config parameter.",
            ));
        };
        self.new_instance(name, &AdapterOptions::from_value(&config.options))
    }

    /// Build the adapter a TOML document names.
    pub fn load_toml(&self, text: &str) -> Result<Adapter> {
        let config: AnnotationsConfig = toml::from_str(text)
            .map_err(|e| AnnotationsError::config(format!("Invalid configuration: {e}")))?;
        self.load_config(&config)
    }

    pub fn new_instance(&self, name: &str, options: &AdapterOptions) -> Result<Adapter> {
        let constructor = self
            .services
            .get(name)
            .ok_or_else(|| AnnotationsError::config(format!("Service '{name}' is not registered")))?;
        tracing::debug!("creating '{}' annotations adapter", name);
        Ok(constructor(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toml_and_json_agree() {
        let from_toml: AnnotationsConfig =
            toml::from_str("adapter = \"apcu\"\n[options]\nprefix = \"app\"\nlifetime = 60\n").unwrap();
        let from_json =
            AnnotationsConfig::from_value(&json!({"adapter": "apcu", "options": {"prefix": "app", "lifetime": 60}}));
        assert_eq!(from_toml, from_json);
    }

    #[test]
    fn non_object_config_has_no_adapter() {
        assert_eq!(AnnotationsConfig::from_value(&json!("memory")).adapter, None);
    }

    #[test]
    fn builtins_are_registered() {
        let factory = AnnotationsFactory::new();
        assert!(factory.has_service("memory"));
        assert!(factory.has_service("apcu"));
        assert!(!factory.has_service("redis"));
    }
}
