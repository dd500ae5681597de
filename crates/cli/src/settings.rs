// Layered configuration: defaults -> catalog-sync.toml -> CATALOG_SYNC__* env

use anyhow::{Context, Result};
use catalog_sync_core::SyncConfig;
use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "catalog-sync";
const DEFAULT_DATABASE_URL: &str = "sqlite://~/.catalog-sync/sync.db";
const ENV_PREFIX: &str = "CATALOG_SYNC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    /// `pretty` or `json`
    pub log_format: String,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_format: "pretty".to_string(),
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration; an explicit file must exist, the default one may not
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::layered(file, env)
    }

    fn layered<S>(file: S, env: Environment) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(
                Config::try_from(&AppConfig::default()).context("Invalid default configuration")?,
            )
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to load configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config
            .sync
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid sync configuration: {}", e))?;
        Ok(config)
    }

    /// Database url with `~` expanded in the file path
    pub fn resolved_database_url(&self) -> String {
        match self.database_url.strip_prefix("sqlite://") {
            Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
            None => self.database_url.clone(),
        }
    }

    /// Parent directory of a file-backed database (None for in-memory)
    pub fn database_dir(&self) -> Option<PathBuf> {
        let url = self.resolved_database_url();
        if url.contains(":memory:") {
            return None;
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        Path::new(path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}
