//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.rt-analyzer.toml` files.

use crate::models::AdverbPair;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".rt-analyzer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Condition labelling.
    #[serde(default)]
    pub conditions: ConditionsConfig,

    /// Plot settings.
    #[serde(default)]
    pub plot: PlotConfig,

    /// Adverb ordering.
    #[serde(default)]
    pub adverbs: AdverbsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default summary report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "rt_summary.md".to_string()
}

/// Results file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the results file.
    #[serde(default = "default_data_path")]
    pub path: String,

    /// Field delimiter: a single character, `\t` or `tab`.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> String {
    "project/data/dataMM.txt".to_string()
}

fn default_delimiter() -> String {
    "\t".to_string()
}

/// Which column holds the condition and how each condition is labelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionsConfig {
    #[serde(default = "default_condition_column")]
    pub column: String,

    #[serde(default = "default_common_label")]
    pub common: String,

    #[serde(default = "default_rare_label")]
    pub rare: String,
}

impl Default for ConditionsConfig {
    fn default() -> Self {
        Self {
            column: default_condition_column(),
            common: default_common_label(),
            rare: default_rare_label(),
        }
    }
}

fn default_condition_column() -> String {
    "category".to_string()
}

fn default_common_label() -> String {
    "common".to_string()
}

fn default_rare_label() -> String {
    "rare".to_string()
}

/// Figure rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Directory the figures are written to.
    #[serde(default = "default_figures_dir")]
    pub figures_dir: String,

    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Lower bound of the surprisal axis in the two-condition scatter plots.
    #[serde(default = "default_surprisal_min")]
    pub surprisal_min: f64,

    /// Upper bound of the surprisal axis in the two-condition scatter plots.
    #[serde(default = "default_surprisal_max")]
    pub surprisal_max: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            figures_dir: default_figures_dir(),
            width: default_width(),
            height: default_height(),
            surprisal_min: default_surprisal_min(),
            surprisal_max: default_surprisal_max(),
        }
    }
}

fn default_figures_dir() -> String {
    "project/figures".to_string()
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    600
}

fn default_surprisal_min() -> f64 {
    10.0
}

fn default_surprisal_max() -> f64 {
    65.0
}

/// Adverb pairs that fix the bar order of the per-adverb figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdverbsConfig {
    /// `[common, rare]` pairs, in display order.
    #[serde(default)]
    pub pairs: Vec<AdverbPair>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject settings no figure can be drawn with.
    pub fn validate(&self) -> Result<()> {
        if self.plot.width == 0 || self.plot.height == 0 {
            anyhow::bail!("Plot width and height must be at least 1 pixel");
        }
        if self.plot.surprisal_min >= self.plot.surprisal_max {
            anyhow::bail!(
                "surprisal_min ({}) must be below surprisal_max ({})",
                self.plot.surprisal_min,
                self.plot.surprisal_max
            );
        }
        if self.conditions.common == self.conditions.rare {
            anyhow::bail!("Common and rare condition labels must differ");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }
        if let Some(ref dir) = args.figures_dir {
            self.plot.figures_dir = dir.display().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data.path)
    }

    pub fn figures_dir(&self) -> PathBuf {
        PathBuf::from(&self.plot.figures_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.general.output)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, OutputFormat};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_args() -> Args {
        Args {
            data: None,
            figures_dir: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            no_plots: false,
            init_config: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.path, "project/data/dataMM.txt");
        assert_eq!(config.data.delimiter, "\t");
        assert_eq!(config.conditions.column, "category");
        assert_eq!(config.plot.figures_dir, "project/figures");
        assert!(config.adverbs.pairs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "summary.json"
verbose = true

[data]
path = "results.tsv"

[plot]
width = 800
surprisal_max = 70.0

[adverbs]
pairs = [["often", "oft"], ["usually", "customarily"]]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "summary.json");
        assert!(config.general.verbose);
        assert_eq!(config.data.path, "results.tsv");
        assert_eq!(config.data.delimiter, "\t");
        assert_eq!(config.plot.width, 800);
        assert_eq!(config.plot.height, 600);
        assert_eq!(config.plot.surprisal_max, 70.0);
        assert_eq!(config.adverbs.pairs.len(), 2);
        assert_eq!(config.adverbs.pairs[1].rare(), "customarily");
    }

    #[test]
    fn test_load_rejects_invalid_ranges() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[plot]\nsurprisal_min = 50.0\nsurprisal_max = 20.0").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.data = Some(PathBuf::from("other.tsv"));
        args.verbose = true;

        config.merge_with_args(&args);
        assert_eq!(config.data.path, "other.tsv");
        assert_eq!(config.plot.figures_dir, "project/figures");
        assert!(config.general.verbose);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[plot]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.plot.width, 1000);
    }
}
