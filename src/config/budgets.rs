//! Budget configuration loading from config.toml
//!
//! The budgets defined in config.toml are used to seed the database on first
//! run. Each budget may override the dates, enabled flag and texts of any of
//! its phases. Dates are quoted `YYYY-MM-DD` strings.

use crate::core::phase_kind::PhaseKind;
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Budgets to seed
    #[serde(default)]
    pub budgets: Vec<BudgetConfig>,
}

/// Configuration for a single budget
#[derive(Debug, Deserialize, Clone)]
pub struct BudgetConfig {
    /// Public name, used to detect budgets that already exist
    pub name: String,
    /// Current phase to select after creation
    #[serde(default = "default_phase")]
    pub phase: PhaseKind,
    /// Whether the budget is public right away
    #[serde(default)]
    pub published: bool,
    /// Per-phase overrides
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

/// Overrides for one phase of a seeded budget
#[derive(Debug, Deserialize, Clone)]
pub struct PhaseConfig {
    /// Phase being configured
    pub kind: PhaseKind,
    /// Enabled flag, defaults to enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// First day of the phase
    pub starts_at: NaiveDate,
    /// Last day of the phase
    pub ends_at: NaiveDate,
    /// Custom name replacing the default label
    pub name: Option<String>,
    /// Short summary
    pub summary: Option<String>,
    /// Long description
    pub description: Option<String>,
}

const fn default_phase() -> PhaseKind {
    PhaseKind::Informing
}

const fn default_enabled() -> bool {
    true
}

/// Loads budget configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or a phase kind is unknown
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses budget configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Path of the seed file, from `BUDGETS_CONFIG` or `config.toml`
#[must_use]
pub fn config_path() -> String {
    std::env::var("BUDGETS_CONFIG").unwrap_or_else(|_| "config.toml".to_string())
}
