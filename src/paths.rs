//! Where Inkwell keeps its files
//!
//! Everything lives in one directory, `~/.config/inkwell/`, so the reading
//! lists survive reinstalls and can be backed up by copying a single folder.
//! The directory is created on first use.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `~/.config/inkwell/`
pub fn inkwell_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("inkwell");
    fs::create_dir_all(&dir).context("Failed to create inkwell directory")?;
    Ok(dir)
}

/// TOML settings read by [`Config::load`](crate::Config::load)
pub fn config_path() -> Result<PathBuf> {
    Ok(inkwell_dir()?.join("config.toml"))
}

/// `SQLite` file holding favorites, bookmarks and their cached posts
pub fn database_path() -> Result<PathBuf> {
    Ok(inkwell_dir()?.join("inkwell.sqlite"))
}
