// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Resource configuration.
//!
//! A [`ResourceDescriptor`] is what a user writes for one resource. Every
//! field except `name` is optional; missing fields are taken from
//! [`ResourceDefaults`] when the descriptor is resolved into the
//! [`ResourceConfig`] a resource is built from. Unknown keys are rejected.
//!
//! ```yaml
//! defaults:
//!   ttlSeconds: 3600
//! resources:
//!   - name: session
//!   - name: user
//!     ttlSeconds: 0
//!     jsonValidation: strict
//!     defaultBodySchema: user
//!     jsonSchemas:
//!       user: { type: object }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{ResourceError, Result};
use crate::state_store::MAX_TTL_SECONDS;


/// How strictly request bodies are checked against declared schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonValidation {
    /// Bodies are accepted whether or not the action declares a schema
    #[default]
    Permissive,
    /// Every action that receives a body must declare a body schema
    Strict,
}

fn default_true() -> bool {
    true
}

/// Defaults applied to every resource of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDefaults {
    /// Record expiry in seconds (0 = never expires)
    #[serde(default)]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub json_validation: JsonValidation,
    /// Register GET/PUT/PATCH/DELETE (default: true)
    #[serde(default = "default_true")]
    pub default_actions: bool,
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            ttl_seconds: 0,
            json_validation: JsonValidation::default(),
            default_actions: true,
        }
    }
}

/// Configuration for one resource as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDescriptor {
    /// Resource name; also the storage key prefix and request subject
    pub name: String,
    #[serde(default, alias = "expire", skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_validation: Option<JsonValidation>,
    /// Schema reference attached to the bodies of PUT and PATCH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_body_schema: Option<String>,
    /// Named schema documents, forwarded as-is
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub json_schemas: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_actions: Option<bool>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn with_json_validation(mut self, json_validation: JsonValidation) -> Self {
        self.json_validation = Some(json_validation);
        self
    }

    pub fn with_default_body_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_body_schema = Some(schema.into());
        self
    }

    pub fn with_json_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.json_schemas.insert(name.into(), schema);
        self
    }

    pub fn without_default_actions(mut self) -> Self {
        self.default_actions = Some(false);
        self
    }

    /// Resolve against plugin defaults, field by field.
    pub fn resolve(&self, defaults: &ResourceDefaults) -> ResourceConfig {
        ResourceConfig {
            name: self.name.clone(),
            ttl_seconds: self.ttl_seconds.unwrap_or(defaults.ttl_seconds),
            json_validation: self.json_validation.unwrap_or(defaults.json_validation),
            default_body_schema: self.default_body_schema.clone(),
            json_schemas: self.json_schemas.clone(),
            default_actions: self.default_actions.unwrap_or(defaults.default_actions),
        }
    }
}

/// Fully resolved configuration a resource is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub name: String,
    /// 0 means records never expire
    pub ttl_seconds: u64,
    pub json_validation: JsonValidation,
    pub default_body_schema: Option<String>,
    pub json_schemas: HashMap<String, Value>,
    pub default_actions: bool,
}

impl ResourceConfig {
    /// Configuration with every default applied.
    pub fn new(name: impl Into<String>) -> Self {
        ResourceDescriptor::new(name).resolve(&ResourceDefaults::default())
    }

    /// Check the configuration can produce a working resource.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidConfig` if:
    /// - The name is empty or contains whitespace
    /// - `ttl_seconds` exceeds [`MAX_TTL_SECONDS`]
    /// - Strict validation is combined with default actions but no default body schema
    /// - The default body schema is not one of `json_schemas` (when any are declared)
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ResourceError::invalid_config("resource name is required"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(ResourceError::invalid_config(format!(
                "resource name '{}' must not contain whitespace",
                self.name
            )));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ResourceError::invalid_config(format!(
                "resource '{}': ttlSeconds {} exceeds the maximum of {MAX_TTL_SECONDS}",
                self.name, self.ttl_seconds
            )));
        }
        if self.default_actions
            && self.json_validation == JsonValidation::Strict
            && self.default_body_schema.is_none()
        {
            return Err(ResourceError::invalid_config(format!(
                "resource '{}': defaultBodySchema is required with defaultActions and strict validation",
                self.name
            )));
        }
        if let Some(schema) = &self.default_body_schema {
            if !self.json_schemas.is_empty() && !self.json_schemas.contains_key(schema) {
                return Err(ResourceError::invalid_config(format!(
                    "resource '{}': defaultBodySchema '{schema}' is not declared in jsonSchemas",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the bootstrap facade: shared defaults plus the resources to serve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginConfig {
    #[serde(default)]
    pub defaults: ResourceDefaults,
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

impl PluginConfig {
    /// Load from a YAML or JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path_ref.display(), e)
        })?;

        // Try YAML first, then JSON
        match serde_yaml::from_str::<PluginConfig>(&content) {
            Ok(config) => Ok(config),
            Err(yaml_err) => match serde_json::from_str::<PluginConfig>(&content) {
                Ok(config) => Ok(config),
                Err(json_err) => Err(anyhow::anyhow!(
                    "Failed to parse config file '{}':\n  YAML error: {}\n  JSON error: {}",
                    path_ref.display(),
                    yaml_err,
                    json_err
                )),
            },
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve every descriptor against the shared defaults.
    pub fn resolved(&self) -> Vec<ResourceConfig> {
        self.resources
            .iter()
            .map(|descriptor| descriptor.resolve(&self.defaults))
            .collect()
    }

    /// Validate every resource and reject duplicate names.
    pub fn validate(&self) -> Result<()> {
        validate_resources(&self.resolved())
    }
}

/// Validate each resolved configuration and reject duplicate resource names.
pub fn validate_resources(configs: &[ResourceConfig]) -> Result<()> {
    let mut names = HashSet::new();
    for config in configs {
        config.validate()?;
        if !names.insert(config.name.as_str()) {
            return Err(ResourceError::invalid_config(format!(
                "Duplicate resource name: '{}'",
                config.name
            )));
        }
    }
    Ok(())
}
