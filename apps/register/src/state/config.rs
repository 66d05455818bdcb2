//! # Configuration State
//!
//! Register configuration loaded once at startup.
//!
//! ## Configuration Sources (later wins)
//! 1. Defaults (this file)
//! 2. Config file (`SHOPFRONT_CONFIG`, else `shopfront.toml` in the platform
//!    config directory)
//! 3. Environment variables (`SHOPFRONT_*`)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shopfront_core::PaymentMethod;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "shopfront.toml";
pub const DATABASE_FILE_NAME: &str = "shopfront.db";

/// Subdirectory of `data_dir` holding the saved tabs.
pub const SESSIONS_DIR_NAME: &str = "sessions";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Register configuration.
///
/// ```toml
/// store_name = "Corner Grocers"
/// data_dir = "/var/lib/shopfront"
/// default_payment_method = "upi"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shown in the prompt and on invoices
    pub store_name: String,

    /// Holds the database (unless overridden) and saved tabs
    pub data_dir: PathBuf,

    /// Explicit database file; defaults to `data_dir/shopfront.db`
    pub database_path: Option<PathBuf>,

    /// Payment method preselected on new tabs
    pub default_payment_method: PaymentMethod,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("com", "shopfront", "register")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"));

        AppConfig {
            store_name: "Shopfront".to_string(),
            data_dir,
            database_path: None,
            default_payment_method: PaymentMethod::Cash,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file if one exists, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => AppConfig::from_file(&path)?,
            _ => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Reading config file");
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `SHOPFRONT_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `SHOPFRONT_DATA_DIR`: Override data directory
    /// - `SHOPFRONT_DB_PATH`: Override database file
    /// - `SHOPFRONT_STORE_NAME`: Override store name
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("SHOPFRONT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("SHOPFRONT_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup("SHOPFRONT_STORE_NAME") {
            self.store_name = name;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_DIR_NAME)
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SHOPFRONT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("com", "shopfront", "register")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            store_name = "Corner Grocers"
            default_payment_method = "upi"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Corner Grocers");
        assert_eq!(config.default_payment_method, PaymentMethod::Upi);
        assert_eq!(config.database_path, None);
        assert_eq!(config.data_dir, AppConfig::default().data_dir);
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("SHOPFRONT_DATA_DIR", "/tmp/shop"),
            ("SHOPFRONT_STORE_NAME", "Night Shift"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store_name, "Night Shift");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/shop/shopfront.db"));
        assert_eq!(config.sessions_dir(), PathBuf::from("/tmp/shop/sessions"));

        config.apply_env(|k| (k == "SHOPFRONT_DB_PATH").then(|| "/srv/pos.db".to_string()));
        assert_eq!(config.database_path(), PathBuf::from("/srv/pos.db"));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        fs::write(&path, "default_payment_method = \"cheque\"").unwrap();
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        fs::write(&path, "store_name = \"Depot\"").unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap().store_name, "Depot");
    }
}
