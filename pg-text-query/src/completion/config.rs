use std::path::Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use crate::Result;

const DEFAULT_CONFIG_YAML: &str = include_str!("default_openai_config.yaml");

/// Request body parameters for a completion endpoint, for example `model` or `temperature`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionParams(Map<String, Value>);

impl CompletionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Returns a copy of these parameters where every key in `overrides` replaces the
    /// value it has here.
    pub fn with_overrides(&self, overrides: &CompletionParams) -> CompletionParams {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            merged.insert(key.clone(), value.clone());
        }
        CompletionParams(merged)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_body(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for CompletionParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Default parameters for the completion endpoints.
///
/// Built once at startup and handed to whoever sends requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub completion_create: CompletionParams,
    #[serde(default)]
    pub chat_completion_create: CompletionParams,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl CompletionConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading completion config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads the config from `path` when given, otherwise uses the built in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_yaml(DEFAULT_CONFIG_YAML),
        }
    }
}
