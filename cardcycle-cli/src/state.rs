use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn cardcycle_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cardcycle"))
}

pub fn ensure_cardcycle_home() -> Result<PathBuf> {
    let dir = cardcycle_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(cardcycle_home()?.join("config.toml"))
}
