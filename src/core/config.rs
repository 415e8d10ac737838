/*!
 * Engine Configuration
 * Runtime tunables, defaulted from `core::limits` and overridable from the environment
 */

use super::errors::{ConfigError, ConfigResult};
use super::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_UNIT, MAX_CALL_DEPTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Prefix shared by every recognised environment variable
pub const ENV_PREFIX: &str = "CONFINE_";

/// Environment variables of the form `CONFINE_PROP_<NAME>` seed host properties
const PROPERTY_PREFIX: &str = "CONFINE_PROP_";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct EngineConfig {
    /// Maximum nested invocations on one thread
    pub max_call_depth: usize,
    /// Global audit ring buffer size
    pub audit_capacity: usize,
    /// Audit events retained per unit
    pub audit_per_unit: usize,
    /// Record allowed checks as well as denials
    pub audit_allowed: bool,
    /// Initial host properties visible to `property(..)`
    pub properties: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("engine.version".into(), env!("CARGO_PKG_VERSION").into());
        properties.insert("os.name".into(), std::env::consts::OS.into());
        properties.insert("os.arch".into(), std::env::consts::ARCH.into());

        Self {
            max_call_depth: MAX_CALL_DEPTH,
            audit_capacity: MAX_AUDIT_EVENTS,
            audit_per_unit: MAX_AUDIT_EVENTS_PER_UNIT,
            audit_allowed: false,
            properties,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build a configuration from an explicit set of variables
    ///
    /// Unrecognised `CONFINE_*` names are ignored so that newer deployments can
    /// run older binaries.
    pub fn from_vars<I, K, V>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            if !key.starts_with(ENV_PREFIX) {
                continue;
            }

            if let Some(name) = key.strip_prefix(PROPERTY_PREFIX) {
                if name.is_empty() {
                    return Err(ConfigError::Invalid {
                        key: key.to_string(),
                        reason: "property name is empty".into(),
                    });
                }
                config
                    .properties
                    .insert(property_name(name), value.to_string());
                continue;
            }

            match key {
                "CONFINE_MAX_CALL_DEPTH" => {
                    config.max_call_depth = parse(key, value)?;
                    if config.max_call_depth == 0 {
                        return Err(ConfigError::Invalid {
                            key: key.to_string(),
                            reason: "must be at least 1".into(),
                        });
                    }
                }
                "CONFINE_AUDIT_CAPACITY" => config.audit_capacity = parse(key, value)?,
                "CONFINE_AUDIT_PER_UNIT" => config.audit_per_unit = parse(key, value)?,
                "CONFINE_AUDIT_ALLOWED" => config.audit_allowed = parse_flag(key, value)?,
                _ => {}
            }
        }

        Ok(config)
    }

    /// Builder-style property override
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style depth override
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    /// Builder-style toggle for auditing allowed checks
    #[must_use]
    pub fn with_audit_allowed(mut self, enabled: bool) -> Self {
        self.audit_allowed = enabled;
        self
    }
}

/// `CONFINE_PROP_USER_HOME` → `user.home`
fn property_name(raw: &str) -> String {
    raw.to_ascii_lowercase().replace('_', ".")
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
