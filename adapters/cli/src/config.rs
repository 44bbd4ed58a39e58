//! Loading of the catalog and match configuration files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use duel_defence_core::{TowerTypeRecord, UnitTypeRecord};
use duel_defence_world::{Catalog, MatchConfig};
use serde::Deserialize;

/// On-disk shape of a catalog document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CatalogFile {
    #[serde(default)]
    towers: Vec<TowerTypeRecord>,
    #[serde(default)]
    units: Vec<UnitTypeRecord>,
}

impl CatalogFile {
    /// Parses a catalog from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("catalog is not valid TOML")
    }

    /// Validates the records and builds the immutable catalog.
    pub(crate) fn into_catalog(self) -> Result<Catalog> {
        Catalog::from_records(&self.towers, &self.units).context("catalog failed validation")
    }
}

/// Reads and validates the catalog at `path`.
pub(crate) fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    CatalogFile::parse(&text)
        .and_then(CatalogFile::into_catalog)
        .with_context(|| format!("failed to load catalog {}", path.display()))
}

/// Reads the match configuration at `path`, or the defaults when absent.
pub(crate) fn load_match_config(path: Option<&Path>) -> Result<MatchConfig> {
    let Some(path) = path else {
        return Ok(MatchConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read match config {}", path.display()))?;
    let config: MatchConfig = toml::from_str(&text)
        .with_context(|| format!("match config {} is not valid TOML", path.display()))?;
    config
        .validate()
        .with_context(|| format!("match config {} is invalid", path.display()))?;
    Ok(config)
}
