//! Seeder configuration stored in `seeder.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name looked up by the command line.
pub const CONFIG_FILE: &str = "seeder.toml";

/// Seeder configuration (TOML).
///
/// Missing fields take their defaults. Relative paths are interpreted
/// against the directory holding the config file; see [`SeederConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeederConfig {
    /// Directory scanned for step definitions.
    pub definitions_dir: PathBuf,

    /// File extension of definition files, without the dot.
    pub extension: String,

    /// JSON file recording completed steps.
    pub state_path: PathBuf,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("seed"),
            extension: "json".to_string(),
            state_path: PathBuf::from("seed/.state/steps.json"),
        }
    }
}

impl SeederConfig {
    pub fn validate(&self) -> Result<()> {
        if self.extension.trim().is_empty() {
            return Err(anyhow!("extension must be non-empty"));
        }
        if self.extension.starts_with('.') {
            return Err(anyhow!("extension must not start with '.'"));
        }
        if self.state_path.file_name().is_none() {
            return Err(anyhow!("state_path must name a file"));
        }
        Ok(())
    }

    /// Make relative paths absolute against `base`.
    pub fn resolve(mut self, base: &Path) -> Self {
        if self.definitions_dir.is_relative() {
            self.definitions_dir = base.join(&self.definitions_dir);
        }
        if self.state_path.is_relative() {
            self.state_path = base.join(&self.state_path);
        }
        self
    }
}

/// Load config from a TOML file and resolve its paths.
///
/// If the file is missing, returns `SeederConfig::default()` resolved against
/// the file's directory.
pub fn load_config(path: &Path) -> Result<SeederConfig> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    if !path.exists() {
        let cfg = SeederConfig::default();
        cfg.validate()?;
        return Ok(cfg.resolve(base));
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SeederConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg.resolve(base))
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SeederConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
