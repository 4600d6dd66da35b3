use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::CliArgs;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    /// Directory holding one TOML file per cached workspace
    pub cache_dir: PathBuf,
    /// Default collection URI; workspaces on other collections are ignored
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UiConfig {
    pub show_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            cache_dir: default_cache_dir(),
            collection: None,
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_summary: true }
    }
}

fn default_cache_dir() -> PathBuf {
    match ProjectDirs::from("", "", "tfvc") {
        Some(proj_dirs) => proj_dirs.data_dir().join("workspaces"),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tfvc")
            .join("workspaces"),
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "tfvc")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("tfvc.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load the config file, then apply command-line overrides.
    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config.clone())?;

        if let Some(cache_dir) = &cli_args.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(collection) = &cli_args.collection {
            config.collection = Some(collection.clone());
        }
        if cli_args.no_summary {
            config.ui.show_summary = false;
        }

        Ok(config)
    }
}
