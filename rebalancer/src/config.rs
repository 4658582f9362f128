//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use driftbook::{DEFAULT_THRESHOLD, Decimal};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub inputs: InputsConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Locations of the four record files.
#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    pub weights: PathBuf,
    pub accounts: PathBuf,
    pub allocations: PathBuf,
    pub prices: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceConfig {
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,
}

fn default_threshold() -> Decimal {
    DEFAULT_THRESHOLD
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write orders here instead of stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// How the order plan is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml(&contents, base_dir)
    }

    /// Parse from a TOML string, resolving relative paths against `base_dir`.
    pub fn from_toml(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let inputs = [
            ("weights", &self.inputs.weights),
            ("accounts", &self.inputs.accounts),
            ("allocations", &self.inputs.allocations),
            ("prices", &self.inputs.prices),
        ];
        for (name, path) in inputs {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(format!("inputs.{name} must not be empty")));
            }
        }
        let threshold = self.rebalance.threshold;
        if threshold < Decimal::ZERO || threshold >= Decimal::ONE {
            return Err(Error::Config(format!(
                "threshold must be in [0, 1), got {threshold}"
            )));
        }
        if self.logging.audit_file.is_empty() {
            return Err(Error::Config("audit_file must not be empty".into()));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.resolve(&self.inputs.weights)
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.resolve(&self.inputs.accounts)
    }

    pub fn allocations_path(&self) -> PathBuf {
        self.resolve(&self.inputs.allocations)
    }

    pub fn prices_path(&self) -> PathBuf {
        self.resolve(&self.inputs.prices)
    }

    /// Configured order file, if any.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.file.as_deref().map(|p| self.resolve(p))
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        self.resolve(Path::new(&self.logging.dir))
            .join(&self.logging.audit_file)
    }
}
