#![allow(dead_code)]
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "netkit.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ConnectionsConfig {
    pub nslookup: Option<bool>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PatternConfig {
    pub product: String,
    pub pattern: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FeedConfig {
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub format: Option<String>,
    /// Checked in order; the first match labels the entry.
    pub patterns: Option<Vec<PatternConfig>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub connections: Option<ConnectionsConfig>,
    pub feed: Option<FeedConfig>,
}

/// Load `path`, or `./netkit.yaml` when no path is given and that file exists.
/// A named file that is missing, or any file that does not parse, is an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg = serde_yaml::from_str(&s)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(Some(cfg))
}
