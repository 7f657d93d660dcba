//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Which record store backs the progress record
//! - An optional protocol definition file and the derived-view thresholds
//! - The default log level
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::protocol::{Protocol, ProtocolRules};

pub const CONFIG_FILE: &str = "config.toml";

/// Record store selected for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Protocol source and derived-view thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// TOML protocol definition replacing the built-in phases and tasks.
    /// Empty means the built-in protocol.
    #[serde(default)]
    pub definition_path: String,
    #[serde(default = "default_terminal_reference_days")]
    pub terminal_reference_days: u32,
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    #[serde(default = "default_trend_rise_threshold")]
    pub trend_rise_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_terminal_reference_days() -> u32 {
    ProtocolRules::default().terminal_reference_days
}
fn default_trend_window() -> usize {
    ProtocolRules::default().trend_window
}
fn default_trend_rise_threshold() -> f64 {
    ProtocolRules::default().trend_rise_threshold
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            definition_path: String::new(),
            terminal_reference_days: default_terminal_reference_days(),
            trend_window: default_trend_window(),
            trend_rise_threshold: default_trend_rise_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ProtocolConfig {
    pub fn rules(&self) -> ProtocolRules {
        ProtocolRules {
            terminal_reference_days: self.terminal_reference_days,
            trend_window: self.trend_window,
            trend_rise_threshold: self.trend_rise_threshold,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    Value::Bool(_) => Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    Value::Object(_) => return Err(invalid("key names a section".into())),
                    _ => Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn collect_leaves(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::collect_leaves(&key, v, out);
                }
            }
            other => out.push((prefix.to_string(), Self::display_value(other))),
        }
    }

    fn display_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Path of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load from `<data_dir>/config.toml`, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unavailable, the config file
    /// exists but cannot be parsed, or the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&data_dir()?)
    }

    /// Load from `dir`, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `<data_dir>/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&data_dir()?)
    }

    /// Persist to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path_in(dir);
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        if val.is_object() {
            return None;
        }
        Some(Self::display_value(val))
    }

    /// Every leaf key with its value, sorted by key.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::collect_leaves("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Set a config value by key, keeping the value's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation. The config is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|message| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })?;
        *self = updated;
        Ok(())
    }

    /// Restore one key, or the whole config when `key` is `None`, to its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn reset(&mut self, key: Option<&str>) -> Result<(), ConfigError> {
        let Some(key) = key else {
            *self = Self::default();
            return Ok(());
        };
        let default = Self::default()
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        self.set(key, &default)
    }

    fn validate(&self) -> Result<(), String> {
        self.protocol.rules().validate().map_err(|e| e.to_string())?;
        if self.logging.level.trim().is_empty() {
            return Err("log level must not be empty".into());
        }
        Ok(())
    }

    /// Build the active protocol: the definition file if configured, else the
    /// built-in one, with the configured thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition file cannot be read or is invalid,
    /// or the thresholds are out of range.
    pub fn protocol(&self) -> Result<Protocol, CoreError> {
        let path = self.protocol.definition_path.trim();
        let base = if path.is_empty() {
            Protocol::standard()
        } else {
            Protocol::load(Path::new(path))?
        };
        let rules = self.protocol.rules();
        rules.validate()?;
        Ok(base.with_rules(rules))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let cfg: Config = toml::from_str("[storage]\nbackend = \"snapshot\"\n").unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Snapshot);
        assert_eq!(cfg.protocol.trend_window, 3);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("storage.backend").as_deref(), Some("sqlite"));
        assert_eq!(cfg.get("protocol.terminal_reference_days").as_deref(), Some("30"));
        assert_eq!(cfg.get("protocol.trend_rise_threshold").as_deref(), Some("0.5"));
        assert_eq!(cfg.get("protocol.definition_path").as_deref(), Some(""));
        assert!(cfg.get("protocol").is_none());
        assert!(cfg.get("logging.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("protocol.trend_window", "5").unwrap();
        cfg.set("protocol.trend_rise_threshold", "0.8").unwrap();
        cfg.set("storage.backend", "snapshot").unwrap();
        cfg.set("protocol.definition_path", "/tmp/protocol.toml").unwrap();
        assert_eq!(cfg.protocol.trend_window, 5);
        assert_eq!(cfg.protocol.trend_rise_threshold, 0.8);
        assert_eq!(cfg.storage.backend, StorageBackend::Snapshot);
        assert_eq!(cfg.protocol.definition_path, "/tmp/protocol.toml");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("storage.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "x"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("protocol.trend_window", "three").is_err());
        assert!(cfg.set("storage.backend", "postgres").is_err());
        assert!(cfg.set("protocol.terminal_reference_days", "0").is_err());
        assert!(cfg.set("protocol", "x").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn reset_single_key_and_all() {
        let mut cfg = Config::default();
        cfg.set("protocol.trend_window", "7").unwrap();
        cfg.set("logging.level", "debug").unwrap();

        cfg.reset(Some("protocol.trend_window")).unwrap();
        assert_eq!(cfg.protocol.trend_window, 3);
        assert_eq!(cfg.logging.level, "debug");

        cfg.reset(None).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.reset(Some("nope.key")).is_err());
    }

    #[test]
    fn list_is_flat_and_sorted() {
        let keys: Vec<String> = Config::default().list().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "logging.level",
                "protocol.definition_path",
                "protocol.terminal_reference_days",
                "protocol.trend_rise_threshold",
                "protocol.trend_window",
                "storage.backend",
            ]
        );
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(Config::path_in(dir.path()).exists());

        let mut cfg = cfg;
        cfg.set("logging.level", "warn").unwrap();
        cfg.save_to(dir.path()).unwrap();
        assert_eq!(Config::load_from(dir.path()).unwrap().logging.level, "warn");
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::path_in(dir.path()), "storage = 3").unwrap();
        assert!(matches!(
            Config::load_from(dir.path()),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn protocol_applies_rules() {
        let mut cfg = Config::default();
        cfg.set("protocol.terminal_reference_days", "60").unwrap();
        let protocol = cfg.protocol().unwrap();
        assert_eq!(protocol.rules.terminal_reference_days, 60);
        assert_eq!(protocol.phases.len(), 3);
    }

    #[test]
    fn protocol_missing_definition_file_fails() {
        let mut cfg = Config::default();
        cfg.set("protocol.definition_path", "/nonexistent/protocol.toml").unwrap();
        assert!(cfg.protocol().is_err());
    }
}
