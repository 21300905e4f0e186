//! Configuration module for Inkwell

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_RELATED_LIMIT;
use crate::paths;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// WordPress REST API root
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Posts requested per API page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound on post pages fetched per refresh
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Column width for wrapped excerpts in the terminal
    #[serde(default = "default_excerpt_width")]
    pub excerpt_width: usize,

    /// Number of related posts shown under a post
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

fn default_api_base() -> String {
    "https://kadiir.com/wp-json/wp/v2".to_string()
}

const fn default_per_page() -> u32 {
    25
}

const fn default_max_pages() -> u32 {
    40
}

const fn default_excerpt_width() -> usize {
    80
}

const fn default_related_limit() -> usize {
    DEFAULT_RELATED_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            excerpt_width: default_excerpt_width(),
            related_limit: default_related_limit(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}
