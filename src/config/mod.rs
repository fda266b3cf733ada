use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "pdfshade";
const APP_CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "store.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store_file: Option<PathBuf>,
    /// Cap on persisted site overrides; oldest are evicted first.
    #[serde(default)]
    pub max_site_overrides: Option<usize>,
    #[serde(default = "default_notices")]
    pub notices: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_file: None,
            max_site_overrides: None,
            notices: default_notices(),
        }
    }
}

const fn default_notices() -> bool {
    true
}

impl AppConfig {
    pub fn store_path(&self) -> Result<PathBuf, ConfigPathError> {
        let (xdg_config_home, home) = config_env_dirs();
        self.store_path_with(xdg_config_home.as_deref(), home.as_deref())
    }

    fn store_path_with(
        &self,
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<PathBuf, ConfigPathError> {
        match &self.store_file {
            Some(path) => Ok(path.clone()),
            None => app_config_path(APP_DIR, STORE_FILE, xdg_config_home, home),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
