//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// rt-analyzer - reading-time statistics for adverb experiments
///
/// Computes mean and median adverb/sentence reading times per participant,
/// word length and adverb, and renders common vs. rare comparison plots.
///
/// Examples:
///   rt-analyzer
///   rt-analyzer --data results/dataMM.txt --figures-dir figures
///   rt-analyzer --no-plots --format json --output summary.json
///   rt-analyzer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Tab-separated results file to analyze
    ///
    /// Defaults to the path in .rt-analyzer.toml, or project/data/dataMM.txt.
    #[arg(short, long, value_name = "FILE", env = "RT_ANALYZER_DATA")]
    pub data: Option<PathBuf>,

    /// Directory the figures are written to (created if missing)
    #[arg(short, long, value_name = "DIR")]
    pub figures_dir: Option<PathBuf>,

    /// Output file path for the statistics summary
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Summary format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .rt-analyzer.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Compute statistics and write the summary without rendering figures
    #[arg(long)]
    pub no_plots: bool,

    /// Generate a default .rt-analyzer.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Results file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Results path is not a file: {}", data.display()));
            }
        }

        if let Some(ref dir) = self.figures_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Figures path exists but is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
