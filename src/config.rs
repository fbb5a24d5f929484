use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ticket::EtaPolicy;
use crate::error::{AppError, AppResult};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:1b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONCURRENCY: usize = 1;

const CONFIG_DIR_ENV: &str = "TRIAGE_CONFIG_DIR";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ollama_host: String,
    pub model: String,
    pub completion_timeout: Duration,
    pub concurrency: usize,
    pub eta_policy: EtaPolicy,
}

/// Values supplied on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ollama_host: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub eta_policy: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            completion_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            eta_policy: EtaPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(&stored, |key| env::var(key).ok())
    }

    /// Layers the stored file and then the environment over the defaults.
    pub fn resolve<F>(stored: &StoredConfig, env_var: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env_var(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = lookup("OLLAMA_HOST").or_else(|| stored.ollama_host.clone()) {
            config.ollama_host = host;
        }
        if let Some(model) = lookup("TRIAGE_MODEL").or_else(|| stored.model.clone()) {
            config.model = model;
        }

        let timeout_secs = match lookup("TRIAGE_TIMEOUT_SECS") {
            Some(raw) => Some(parse_number::<u64>("TRIAGE_TIMEOUT_SECS", &raw)?),
            None => stored.timeout_secs,
        };
        let concurrency = match lookup("TRIAGE_CONCURRENCY") {
            Some(raw) => Some(parse_number::<usize>("TRIAGE_CONCURRENCY", &raw)?),
            None => stored.concurrency,
        };
        let eta_policy = lookup("TRIAGE_ETA_POLICY").or_else(|| stored.eta_policy.clone());

        config.apply(ConfigOverrides {
            ollama_host: None,
            model: None,
            timeout_secs,
            concurrency,
            eta_policy,
        })?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) -> AppResult<()> {
        if let Some(host) = overrides.ollama_host {
            self.ollama_host = host;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(secs) = overrides.timeout_secs {
            if secs == 0 {
                return Err(AppError::Configuration(
                    "completion timeout must be at least 1 second".to_string(),
                ));
            }
            self.completion_timeout = Duration::from_secs(secs);
        }
        if let Some(concurrency) = overrides.concurrency {
            if concurrency == 0 {
                return Err(AppError::Configuration(
                    "concurrency must be at least 1".to_string(),
                ));
            }
            self.concurrency = concurrency;
        }
        if let Some(policy) = overrides.eta_policy {
            self.eta_policy = EtaPolicy::from_str(&policy).ok_or_else(|| {
                AppError::Configuration(format!(
                    "unknown eta policy '{policy}' (expected 'model' or 'priority')"
                ))
            })?;
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::Configuration(format!("{name} must be a number, got '{raw}'")))
}

/// Settings persisted by `triage config init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_policy: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("triage"))
        .ok_or_else(|| {
            AppError::Configuration(format!(
                "could not determine a config directory; set {CONFIG_DIR_ENV}"
            ))
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let config = AppConfig::resolve(&StoredConfig::default(), env_from(&[])).unwrap();
        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.completion_timeout, Duration::from_secs(120));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.eta_policy, EtaPolicy::Model);
    }

    #[test]
    fn environment_wins_over_stored_file() {
        let stored = StoredConfig {
            ollama_host: Some("http://stored:11434".to_string()),
            model: Some("stored-model".to_string()),
            timeout_secs: Some(30),
            concurrency: Some(2),
            eta_policy: Some("priority".to_string()),
        };
        let env = env_from(&[
            ("TRIAGE_MODEL", "env-model"),
            ("TRIAGE_CONCURRENCY", "8"),
            ("OLLAMA_HOST", "  "),
        ]);
        let config = AppConfig::resolve(&stored, env).unwrap();
        assert_eq!(config.ollama_host, "http://stored:11434");
        assert_eq!(config.model, "env-model");
        assert_eq!(config.completion_timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.eta_policy, EtaPolicy::Priority);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_number = env_from(&[("TRIAGE_TIMEOUT_SECS", "soon")]);
        assert!(matches!(
            AppConfig::resolve(&StoredConfig::default(), bad_number),
            Err(AppError::Configuration(_))
        ));

        let mut config = AppConfig::default();
        let zero = ConfigOverrides {
            concurrency: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(config.apply(zero).is_err());

        let policy = ConfigOverrides {
            eta_policy: Some("guess".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(config.apply(policy).is_err());
    }

    #[test]
    fn overrides_apply_last() {
        let mut config = AppConfig::default();
        config
            .apply(ConfigOverrides {
                model: Some("llama3.2".to_string()),
                timeout_secs: Some(5),
                ..ConfigOverrides::default()
            })
            .unwrap();
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.completion_timeout, Duration::from_secs(5));
        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
    }

    #[test]
    fn stored_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        assert_eq!(StoredConfig::load_from(&path).unwrap(), StoredConfig::default());

        let stored = StoredConfig {
            model: Some("gemma3:4b".to_string()),
            concurrency: Some(4),
            ..StoredConfig::default()
        };
        stored.save_to(&path).unwrap();
        assert_eq!(StoredConfig::load_from(&path).unwrap(), stored);
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            StoredConfig::load_from(&path),
            Err(AppError::Configuration(_))
        ));
    }
}
