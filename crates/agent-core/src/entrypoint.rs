//! Entrypoint System
//!
//! Named, priced operations an agent exposes over HTTP. Entrypoints are
//! registered at startup and invoked by key with a JSON input.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Invocation request for an entrypoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntrypointCall {
    /// Entrypoint key
    pub key: String,

    /// JSON input; `null` is treated as an empty object
    #[serde(default)]
    pub input: serde_json::Value,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl EntrypointCall {
    pub fn new(key: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            input,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Deserialize the input into an entrypoint's typed request
    pub fn parse_input<T: DeserializeOwned>(&self) -> Result<T> {
        let input = if self.input.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            self.input.clone()
        };
        serde_json::from_value(input).map_err(|e| AgentError::InvalidInput(e.to_string()))
    }
}

/// Result of an entrypoint invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntrypointOutput {
    /// Entrypoint that was called
    pub key: String,

    /// Call ID (if provided in request)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Whether the operation produced its primary result
    pub success: bool,

    /// Structured output
    pub output: serde_json::Value,
}

impl EntrypointOutput {
    pub fn success(key: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            id: None,
            success: true,
            output,
        }
    }

    pub fn failure(key: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            id: None,
            success: false,
            output,
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// Parameter definition for an entrypoint manifest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParameterSchema {
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| serde_json::json!(v)).collect());
        self
    }
}

/// Public description of an entrypoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntrypointManifest {
    /// Unique key
    pub key: String,

    /// Human-readable description
    pub description: String,

    /// Price per call in USD, as a decimal string; `None` means free
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,
}

/// Entrypoint trait - implement to expose a new operation
#[async_trait]
pub trait Entrypoint: Send + Sync {
    /// Manifest shown to clients
    fn manifest(&self) -> EntrypointManifest;

    /// Run the operation
    async fn invoke(&self, call: &EntrypointCall) -> Result<EntrypointOutput>;

    /// Validate input before invocation (optional)
    fn validate(&self, call: &EntrypointCall) -> Result<()> {
        let manifest = self.manifest();
        let empty = serde_json::Map::new();
        let input = match &call.input {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => &empty,
            _ => return Err(AgentError::InvalidInput("input must be a JSON object".into())),
        };

        for param in &manifest.parameters {
            if param.required && !input.contains_key(&param.name) {
                return Err(AgentError::InvalidInput(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available entrypoints
pub struct EntrypointRegistry {
    entrypoints: HashMap<String, Arc<dyn Entrypoint>>,
}

impl Default for EntrypointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrypointRegistry {
    pub fn new() -> Self {
        Self {
            entrypoints: HashMap::new(),
        }
    }

    /// Register a new entrypoint
    pub fn register<E: Entrypoint + 'static>(&mut self, entrypoint: E) {
        self.register_boxed(Arc::new(entrypoint));
    }

    /// Register a shared entrypoint
    pub fn register_boxed(&mut self, entrypoint: Arc<dyn Entrypoint>) {
        let manifest = entrypoint.manifest();
        tracing::debug!(key = %manifest.key, "Registered entrypoint");
        self.entrypoints.insert(manifest.key, entrypoint);
    }

    /// Get an entrypoint by key
    pub fn get(&self, key: &str) -> Option<Arc<dyn Entrypoint>> {
        self.entrypoints.get(key).cloned()
    }

    /// Validate and invoke
    pub async fn invoke(&self, call: &EntrypointCall) -> Result<EntrypointOutput> {
        let entrypoint = self
            .get(&call.key)
            .ok_or_else(|| AgentError::EntrypointNotFound(call.key.clone()))?;

        entrypoint.validate(call)?;

        let output = entrypoint.invoke(call).await?;
        Ok(output.with_id(call.id.clone()))
    }

    /// All manifests, sorted by key
    pub fn manifests(&self) -> Vec<EntrypointManifest> {
        let mut manifests: Vec<_> = self.entrypoints.values().map(|e| e.manifest()).collect();
        manifests.sort_by(|a, b| a.key.cmp(&b.key));
        manifests
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entrypoints.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of registered entrypoints
    pub fn len(&self) -> usize {
        self.entrypoints.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entrypoints.is_empty()
    }
}
