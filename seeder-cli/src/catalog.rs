//! Built-in item types seeded by the command line.
//!
//! Each handler appends the decoded item as one JSON line to
//! `<out>/<type>.jsonl`, so a seed run leaves an inspectable trace of what it
//! applied.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use seeder::ItemRegistry;

pub const COUNTRY: &str = "Country";
pub const CURRENCY: &str = "Currency";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// ISO 4217 code.
    pub code: String,
    pub name: String,
    pub minor_units: u8,
}

impl Country {
    fn check(&self) -> Result<()> {
        if self.code.len() != 2 || !self.code.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("country code must be two upper-case letters, got {:?}", self.code);
        }
        Ok(())
    }
}

impl Currency {
    fn check(&self) -> Result<()> {
        if self.code.len() != 3 || !self.code.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("currency code must be three upper-case letters, got {:?}", self.code);
        }
        if self.minor_units > 4 {
            bail!(
                "currency {} has {} minor units, at most 4 allowed",
                self.code,
                self.minor_units
            );
        }
        Ok(())
    }
}

/// Append-only JSON-lines file.
#[derive(Debug, Clone)]
struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append<T: Serialize>(&self, item: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let line = serde_json::to_string(item).context("serialize item")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("append {}", self.path.display()))?;
        debug!(path = %self.path.display(), "item written");
        Ok(())
    }
}

/// File the handler for `type_name` appends to.
pub fn output_path(out_dir: &Path, type_name: &str) -> PathBuf {
    out_dir.join(format!("{}.jsonl", type_name.to_ascii_lowercase()))
}

/// Register every catalog type with a handler writing under `out_dir`.
pub fn register_catalog(registry: &mut ItemRegistry, out_dir: &Path) {
    let sink = JsonlSink::new(output_path(out_dir, COUNTRY));
    registry.register::<Country, _>(COUNTRY, move |country| {
        country.check()?;
        sink.append(&country)
    });
    let sink = JsonlSink::new(output_path(out_dir, CURRENCY));
    registry.register::<Currency, _>(CURRENCY, move |currency| {
        currency.check()?;
        sink.append(&currency)
    });
}

pub fn catalog_registry(out_dir: &Path) -> ItemRegistry {
    let mut registry = ItemRegistry::new();
    register_catalog(&mut registry, out_dir);
    registry
}
