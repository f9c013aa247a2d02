//! TOML-based application configuration.
//!
//! Stores the daemon's operating settings:
//! - Backend API base URL
//! - Push server public key
//! - Digest and review schedule slots
//!
//! Configuration is stored at `~/.config/herald/config.toml`
//! (`~/.config/herald-dev/` when `HERALD_ENV=dev`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::scheduler::SchedulerConfig;

/// Backend API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Push subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Server-provided VAPID public key; empty disables push setup.
    #[serde(default)]
    pub server_key: String,
}

/// Recurring summary notification slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestsConfig {
    #[serde(default = "default_digest_hour")]
    pub daily_digest_hour: u32,
    /// 0 = Monday .. 6 = Sunday.
    #[serde(default = "default_review_weekday")]
    pub weekly_review_weekday: u8,
    #[serde(default = "default_review_hour")]
    pub weekly_review_hour: u32,
    /// Minutes past a due date before the overdue nudge.
    #[serde(default = "default_overdue_grace")]
    pub overdue_grace_min: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/herald/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub digests: DigestsConfig,
}

// Default functions
fn default_base_url() -> String {
    "http://127.0.0.1:8787/api".to_string()
}
fn default_digest_hour() -> u32 {
    8
}
fn default_review_weekday() -> u8 {
    6
}
fn default_review_hour() -> u32 {
    19
}
fn default_overdue_grace() -> i64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            server_key: String::new(),
        }
    }
}

impl Default for DigestsConfig {
    fn default() -> Self {
        Self {
            daily_digest_hour: default_digest_hour(),
            weekly_review_weekday: default_review_weekday(),
            weekly_review_hour: default_review_hour(),
            overdue_grace_min: default_overdue_grace(),
        }
    }
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            push: PushConfig::default(),
            digests: DigestsConfig::default(),
        }
    }
}

/// Returns `~/.config/herald[-dev]/` based on HERALD_ENV.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HERALD_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("herald-dev")
    } else {
        base_dir.join("herald")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl HeraldConfig {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing and returning the default when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error. Never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// The scheduler knobs this config selects.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            overdue_grace_min: self.digests.overdue_grace_min,
            daily_digest_hour: self.digests.daily_digest_hour,
            weekly_review_weekday: self.digests.weekly_review_weekday,
            weekly_review_hour: self.digests.weekly_review_hour,
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// as the field's type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

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
) -> Result<(), ConfigError> {
    let unknown = || ConfigError::UnknownKey(key.to_string());
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let mut parts = key.split('.').peekable();
    if parts.peek().is_none() {
        return Err(unknown());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        let is_leaf = parts.peek().is_none();
        if is_leaf {
            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        current = current.get_mut(part).ok_or_else(unknown)?;
    }

    Err(unknown())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = HeraldConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HeraldConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api.base_url, cfg.api.base_url);
        assert_eq!(parsed.digests.daily_digest_hour, 8);
        assert_eq!(parsed.digests.weekly_review_weekday, 6);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let parsed: HeraldConfig =
            toml::from_str("[api]\nbase_url = \"https://tasks.example/api\"\n").unwrap();
        assert_eq!(parsed.api.base_url, "https://tasks.example/api");
        assert_eq!(parsed.digests.weekly_review_hour, 19);
        assert!(parsed.push.server_key.is_empty());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = HeraldConfig::default();
        assert_eq!(
            cfg.get("digests.daily_digest_hour").as_deref(),
            Some("8")
        );
        assert_eq!(
            cfg.get("api.base_url").as_deref(),
            Some("http://127.0.0.1:8787/api")
        );
        assert!(cfg.get("api.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(HeraldConfig::default()).unwrap();
        set_json_value_by_path(&mut json, "digests.daily_digest_hour", "9").unwrap();
        assert_eq!(
            get_json_value_by_path(&json, "digests.daily_digest_hour").unwrap(),
            &serde_json::Value::Number(9.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(HeraldConfig::default()).unwrap();
        let result = set_json_value_by_path(&mut json, "digests.nonexistent", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(HeraldConfig::default()).unwrap();
        let result = set_json_value_by_path(&mut json, "digests.daily_digest_hour", "not_a_number");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn scheduler_config_mirrors_digest_settings() {
        let mut cfg = HeraldConfig::default();
        cfg.digests.daily_digest_hour = 7;
        cfg.digests.overdue_grace_min = 30;
        let sched = cfg.scheduler_config();
        assert_eq!(sched.daily_digest_hour, 7);
        assert_eq!(sched.overdue_grace_min, 30);
        assert_eq!(sched.weekly_review_weekday, 6);
    }
}
