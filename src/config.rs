use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::analysis::AnalysisOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_margin_pct")]
    pub max_margin_pct: f64,
    #[serde(default)]
    pub min_total_votes: u64,
    #[serde(default = "default_governor_contest_pattern")]
    pub governor_contest_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Provenance written to `source_file` when a race has no import file.
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<String>,
    pub max_margin_pct: Option<f64>,
    pub min_total_votes: Option<u64>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/flip-oracle/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
        if let Some(max_margin_pct) = overrides.max_margin_pct {
            self.analysis.max_margin_pct = max_margin_pct;
        }
        if let Some(min_total_votes) = overrides.min_total_votes {
            self.analysis.min_total_votes = min_total_votes;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let margin = self.analysis.max_margin_pct;
        if !(0.0..=100.0).contains(&margin) {
            bail!("max_margin_pct must be between 0 and 100, got {margin}");
        }
        if self.analysis.governor_contest_pattern.trim().is_empty() {
            bail!("governor_contest_pattern must not be empty");
        }
        Ok(())
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            max_margin_pct: self.analysis.max_margin_pct,
            min_total_votes: self.analysis.min_total_votes,
            county: None,
            contest_filter: None,
            governor_pattern: self.analysis.governor_contest_pattern.clone(),
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
db_path = "~/.local/share/flip-oracle/flip-oracle.db"

[analysis]
# Republican-held races above this margin are not listed as flippable.
max_margin_pct = 15.0
min_total_votes = 0
governor_contest_pattern = "governor"

[export]
source_label = "vote_totals"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_margin_pct: default_max_margin_pct(),
            min_total_votes: 0,
            governor_contest_pattern: default_governor_contest_pattern(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source_label: default_source_label(),
        }
    }
}

fn default_db_path() -> String {
    "~/.local/share/flip-oracle/flip-oracle.db".to_string()
}

fn default_max_margin_pct() -> f64 {
    15.0
}

fn default_governor_contest_pattern() -> String {
    "governor".to_string()
}

fn default_source_label() -> String {
    "vote_totals".to_string()
}
