use std::collections::HashMap;

use super::{ConfigError, MvcConfig};

const CONTROLLERS_PREFIX: &str = "mvc.controllers.";

/// Typed view of the `mvc.*` configuration keys.
///
/// ```yaml
/// mvc:
///   log:
///     routes: true
///   body:
///     limit: 2097152
///   trace: true
///   catch:
///     panic: true
///   controllers:
///     items:
///       prefix: /api/items
///       enabled: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvcSettings {
    /// Report every registered route to the diagnostics sink.
    pub log_routes: bool,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Install the HTTP trace layer.
    pub trace: bool,
    /// Turn handler panics into JSON 500 responses.
    pub catch_panic: bool,
    controllers: HashMap<String, ControllerSettings>,
}

/// Per-controller overrides, keyed by the controller's lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub prefix: Option<String>,
    pub enabled: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            prefix: None,
            enabled: true,
        }
    }
}

impl Default for MvcSettings {
    fn default() -> Self {
        Self {
            log_routes: true,
            body_limit: 2 * 1024 * 1024,
            trace: true,
            catch_panic: true,
            controllers: HashMap::new(),
        }
    }
}

impl MvcSettings {
    pub fn from_config(config: &MvcConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut names: Vec<&str> = config
            .keys()
            .filter_map(|key| key.strip_prefix(CONTROLLERS_PREFIX))
            .filter_map(|rest| rest.split_once('.').map(|(name, _)| name))
            .collect();
        names.sort_unstable();
        names.dedup();

        let mut controllers = HashMap::with_capacity(names.len());
        for name in names {
            let prefix = config.get_or(&format!("{CONTROLLERS_PREFIX}{name}.prefix"), None)?;
            let enabled = config.get_or(&format!("{CONTROLLERS_PREFIX}{name}.enabled"), true)?;
            controllers.insert(name.to_ascii_lowercase(), ControllerSettings { prefix, enabled });
        }

        Ok(Self {
            log_routes: config.get_or("mvc.log.routes", defaults.log_routes)?,
            body_limit: config.get_or("mvc.body.limit", defaults.body_limit)?,
            trace: config.get_or("mvc.trace", defaults.trace)?,
            catch_panic: config.get_or("mvc.catch.panic", defaults.catch_panic)?,
            controllers,
        })
    }

    /// Overrides for the controller named `name` (case-insensitive).
    pub fn controller(&self, name: &str) -> ControllerSettings {
        self.controllers
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_controller(&mut self, name: &str, settings: ControllerSettings) {
        self.controllers.insert(name.to_ascii_lowercase(), settings);
    }
}
