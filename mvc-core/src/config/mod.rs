mod loader;
mod settings;
mod value;

use std::collections::HashMap;
use std::path::Path;

pub use settings::{ControllerSettings, MvcSettings};
pub use value::{ConfigValue, FromConfigValue};

/// Prefix of the environment variables overlaid onto the configuration.
const ENV_PREFIX: &str = "MVC_";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key is not present.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// The configuration file could not be read or parsed.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Flattened key/value configuration.
///
/// Nested YAML mappings become dot-separated keys (`mvc.body.limit`).
/// Resolution order, lowest to highest priority:
/// 1. the YAML file
/// 2. `.env` (loaded into the process environment, never overwriting)
/// 3. `MVC_*` environment variables (`MVC_BODY_LIMIT` overrides `mvc.body.limit`)
#[derive(Debug, Clone, Default)]
pub struct MvcConfig {
    values: HashMap<String, ConfigValue>,
}

impl MvcConfig {
    /// Load `path` (a missing file yields an empty base), then `.env`, then
    /// the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_file(path.as_ref(), &mut values)?;

        let _ = dotenvy::dotenv();
        overlay_env(&mut values, std::env::vars());

        Ok(Self { values })
    }

    /// Parse a YAML string. The environment is not consulted.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self { values })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Like [`get`](Self::get), but a missing key yields `default`.
    /// A present key of the wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.get(key) {
            Err(ConfigError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

fn overlay_env(
    values: &mut HashMap<String, ConfigValue>,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    for (name, value) in vars {
        if !name.starts_with(ENV_PREFIX) {
            continue;
        }
        let key = name.to_ascii_lowercase().replace('_', ".");
        values.insert(key, ConfigValue::String(value));
    }
}
