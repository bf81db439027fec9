//! User settings read from `config.json` in the platform config directory.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::companies::DEFAULT_SIMILARITY_THRESHOLD;
use crate::db::Database;
use crate::models::DEFAULT_CURRENCY;

pub const DB_ENV_VAR: &str = "THRIVE_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub database_path: Option<PathBuf>,
    pub default_currency: String,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    pub similarity_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            default_currency: DEFAULT_CURRENCY.to_string(),
            log_filter: None,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "thrive").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Database location: `--db` flag, then `THRIVE_DB`, then the config file,
    /// then the platform data directory.
    pub fn database_path(&self, cli: Option<&Path>) -> PathBuf {
        let env = std::env::var_os(DB_ENV_VAR).map(PathBuf::from);
        self.database_path_from(cli, env)
    }

    fn database_path_from(&self, cli: Option<&Path>, env: Option<PathBuf>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or(env.filter(|p| !p.as_os_str().is_empty()))
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(Database::default_path)
    }
}

/// Loads and validates the config. A missing file yields the defaults.
/// - If `path` is None, uses the platform config directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match Config::default_path() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let mut cfg: Config = serde_json::from_str(&content)?;
    cfg.default_currency = cfg.default_currency.trim().to_uppercase();
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let currency = &cfg.default_currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Invalid("defaultCurrency must be a 3-letter currency code"));
    }
    if !(cfg.similarity_threshold > 0.0 && cfg.similarity_threshold <= 1.0) {
        return Err(ConfigError::Invalid("similarityThreshold must be in (0, 1]"));
    }
    if cfg.log_filter.as_deref().is_some_and(|f| f.trim().is_empty()) {
        return Err(ConfigError::Invalid("logFilter must be non-empty when set"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_currency, "USD");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config(r#"{"defaultCurrency": "eur", "logFilter": "thrive=debug"}"#);
        let cfg = load(Some(file.path())).unwrap();
        assert_eq!(cfg.default_currency, "EUR");
        assert_eq!(cfg.log_filter.as_deref(), Some("thrive=debug"));
        assert_eq!(cfg.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert!(cfg.database_path.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config(r#"{"defaultCurrency": "dollars"}"#);
        assert!(matches!(load(Some(file.path())), Err(ConfigError::Invalid(_))));

        let file = write_config(r#"{"similarityThreshold": 0}"#);
        assert!(matches!(load(Some(file.path())), Err(ConfigError::Invalid(_))));

        let file = write_config(r#"{"similarityThreshold": 1.5}"#);
        assert!(matches!(load(Some(file.path())), Err(ConfigError::Invalid(_))));

        let file = write_config("{not json");
        assert!(matches!(load(Some(file.path())), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_database_path_precedence() {
        let cfg = Config {
            database_path: Some(PathBuf::from("/from/config.db")),
            ..Config::default()
        };
        let cli = PathBuf::from("/from/cli.db");
        let env = Some(PathBuf::from("/from/env.db"));

        assert_eq!(cfg.database_path_from(Some(&cli), env.clone()), cli);
        assert_eq!(cfg.database_path_from(None, env.clone()), PathBuf::from("/from/env.db"));
        assert_eq!(cfg.database_path_from(None, Some(PathBuf::new())), PathBuf::from("/from/config.db"));
        assert_eq!(cfg.database_path_from(None, None), PathBuf::from("/from/config.db"));
        assert_eq!(Config::default().database_path_from(None, None), Database::default_path());
    }
}
