//! TOML-based configuration.
//!
//! Stores:
//! - Default scheduler options for new computations
//! - Cache eviction policy
//! - Debounce quiet period
//! - Display locale
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::cache::CachePolicy;
use crate::error::{ConfigError, Result};
use crate::interval::TimeRange;
use crate::labels::Locale;
use crate::schedule::SchedulerOptions;

const FILE_NAME: &str = "config.toml";

/// Keys that may be absent from the serialized config.
const OPTIONAL_KEYS: &[&str] = &["scheduler.self_study_window"];

/// Eviction policy name as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicyKind {
    Session,
    #[default]
    Lru,
    Latest,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicyKind,
    /// Entry limit for the `lru` policy
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Debounce configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

/// Display configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub locale: Locale,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerOptions,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

// Default functions
fn default_capacity() -> usize {
    128
}
fn default_quiet_period_ms() -> u64 {
    500
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicyKind::default(),
            capacity: default_capacity(),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        match self.policy {
            CachePolicyKind::Session => CachePolicy::Session,
            CachePolicyKind::Lru => CachePolicy::Lru {
                capacity: self.capacity,
            },
            CachePolicyKind::Latest => CachePolicy::Latest,
        }
    }
}

impl DebounceConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
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

                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                    None if OPTIONAL_KEYS.contains(&key) => {
                        if value.is_empty() || value.eq_ignore_ascii_case("none") {
                            obj.remove(part);
                            return Ok(());
                        }
                        Self::parse_optional(value).map_err(invalid)?
                    }
                    None => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Parse a value for an optional key: JSON first, then `HH:MM-HH:MM`.
    fn parse_optional(value: &str) -> std::result::Result<serde_json::Value, String> {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(value) {
            return Ok(json);
        }
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{value}'"))?;
        let start = start.trim().parse().map_err(|e: crate::error::SchedulingError| e.to_string())?;
        let end = end.trim().parse().map_err(|e: crate::error::SchedulingError| e.to_string())?;
        let range = TimeRange::new(start, end)
            .ok_or_else(|| format!("'{value}' does not end after it starts"))?;
        serde_json::to_value(range).map_err(|e| e.to_string())
    }

    fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    if OPTIONAL_KEYS.contains(&key.as_str()) {
                        out.push((key, Self::display_optional(v)));
                    } else {
                        Self::flatten(&key, v, out);
                    }
                }
            }
            other => out.push((prefix.to_string(), Self::display_value(other))),
        }
    }

    fn display_optional(value: &serde_json::Value) -> String {
        serde_json::from_value::<TimeRange>(value.clone())
            .map(|range| range.to_string())
            .unwrap_or_else(|_| Self::display_value(value))
    }

    fn display_value(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Path of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(FILE_NAME)
    }

    /// Load from `dir`, writing and returning the default if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path,
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Load from the data directory.
    ///
    /// # Errors
    ///
    /// See [`Config::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(&data_dir()?)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let path = Self::path_in(dir);
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&data_dir()?)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key) {
            Some(val) if OPTIONAL_KEYS.contains(&key) => Some(Self::display_optional(val)),
            Some(val) => Some(Self::display_value(val)),
            None if OPTIONAL_KEYS.contains(&key) => Some("none".to_string()),
            None => None,
        }
    }

    /// Set a config value by key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting scheduler options are out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated
            .scheduler
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its current value, sorted by section.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let json = serde_json::to_value(self)?;
        let mut out = Vec::new();
        Self::flatten("", &json, &mut out);
        for key in OPTIONAL_KEYS {
            if !out.iter().any(|(k, _)| k == key) {
                out.push((key.to_string(), "none".to_string()));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.review_cadence, 7);
        assert_eq!(parsed.cache.capacity, 128);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[display]\nlocale = \"ko\"\n").unwrap();
        assert_eq!(parsed.display.locale, Locale::Ko);
        assert_eq!(parsed.debounce.quiet_period(), Duration::from_millis(500));
        assert_eq!(parsed.cache.policy(), CachePolicy::Lru { capacity: 128 });
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.review_cadence").as_deref(), Some("7"));
        assert_eq!(cfg.get("cache.policy").as_deref(), Some("lru"));
        assert_eq!(cfg.get("display.locale").as_deref(), Some("en"));
        assert_eq!(cfg.get("scheduler.self_study_window").as_deref(), Some("none"));
        assert!(cfg.get("scheduler.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("scheduler.review_cadence", "3").unwrap();
        cfg.set("scheduler.review_days", "2").unwrap();
        cfg.set("scheduler.designated_holiday_self_study_hours", "2.5").unwrap();
        cfg.set("cache.policy", "latest").unwrap();
        cfg.set("display.locale", "ko").unwrap();

        assert_eq!(cfg.scheduler.review_cadence, 3);
        assert_eq!(cfg.scheduler.review_days, 2);
        assert_eq!(cfg.scheduler.designated_holiday_self_study_hours, 2.5);
        assert_eq!(cfg.cache.policy(), CachePolicy::Latest);
        assert_eq!(cfg.display.locale, Locale::Ko);
    }

    #[test]
    fn set_and_clear_self_study_window() {
        let mut cfg = Config::default();
        cfg.set("scheduler.self_study_window", "19:00-22:00").unwrap();
        assert_eq!(
            cfg.scheduler.self_study_window,
            TimeRange::new("19:00".parse().unwrap(), "22:00".parse().unwrap())
        );
        cfg.set("scheduler.self_study_window", "none").unwrap();
        assert!(cfg.scheduler.self_study_window.is_none());
        cfg.set("scheduler.self_study_window", "18:30-21:00").unwrap();
        assert_eq!(cfg.get("scheduler.self_study_window").as_deref(), Some("18:30-21:00"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("scheduler.nonexistent_key", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("display.locale", "fr").is_err());
        assert!(cfg.set("scheduler.review_cadence", "often").is_err());
        assert!(cfg.set("scheduler.review_days", "8").is_err());
        assert!(cfg.set("scheduler.non_study_self_study_hours", "30").is_err());
        assert!(cfg.set("scheduler.self_study_window", "22:00-19:00").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_lists_every_leaf() {
        let entries = Config::default().entries().unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        for key in [
            "scheduler.review_cadence",
            "scheduler.review_days",
            "scheduler.self_study_window",
            "cache.policy",
            "cache.capacity",
            "debounce.quiet_period_ms",
            "display.locale",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn load_writes_default_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(Config::path_in(dir.path()).exists());

        let mut changed = cfg.clone();
        changed.set("debounce.quiet_period_ms", "250").unwrap();
        changed.save_to(dir.path()).unwrap();
        let reloaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.debounce.quiet_period_ms, 250);
    }

    #[test]
    fn load_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Config::path_in(dir.path()), "[cache\npolicy = ").unwrap();
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
    }
}
