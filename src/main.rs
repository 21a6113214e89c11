//! rt-analyzer - reading-time statistics for adverb experiments
//!
//! A CLI tool that summarizes adverb and sentence reading times from a
//! self-paced reading experiment and renders common vs. rare comparison plots.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (missing or malformed results file, bad config, write failure)

mod analysis;
mod cli;
mod config;
mod data;
mod models;
mod plot;
mod report;

use analysis::ConditionTables;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::Condition;
use plot::FigureSettings;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config)?;

    info!("rt-analyzer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(&args, &config) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .rt-analyzer.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the data path, condition labels, and adverb pairs.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` directives refine the level chosen on the command line.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete analysis: load, summarize, plot, report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Load the trials
    let data_path = config.data_path();
    println!("📥 Loading results: {}", data_path.display());

    let delimiter = data::parse_delimiter(&config.data.delimiter)?;
    let table = data::load_table(&data_path, delimiter)?;
    data::validate_schema(&table, data::REQUIRED_COLUMNS)
        .with_context(|| format!("Unexpected layout in {}", data_path.display()))?;

    let conditions = ConditionTables::split(table, (&config.conditions).into())?;
    for condition in Condition::ALL {
        if conditions.get(condition).is_empty() {
            warn!("No {} trials found", condition);
        }
    }

    // Step 2: Render figures
    let figures = if args.no_plots {
        debug!("Skipping figures (--no-plots)");
        Vec::new()
    } else {
        let settings = FigureSettings::from_config(config, !args.quiet);
        println!("\n🎨 Rendering figures to {}", settings.figures_dir.display());
        plot::render_figures(&conditions, &settings)?
    };

    // Step 3: Build and save the summary
    println!("\n📝 Generating summary...");
    let duration = start_time.elapsed().as_secs_f64();
    let summary = report::build_report(
        &conditions,
        &config.adverbs.pairs,
        &data_path,
        &figures,
        duration,
    )?;

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&summary)?,
        OutputFormat::Markdown => report::generate_markdown_report(&summary),
    };

    let output_path = config.output_path();
    write_output(&output_path, &output)?;

    // Print summary
    println!("\n📊 Reading-Time Summary:");
    println!("   Trials: {}", summary.metadata.trials);
    println!("   Participants: {}", summary.metadata.participants);
    for condition in &summary.conditions {
        let overall = &condition.overall;
        if overall.is_empty() {
            println!("   - {}: no trials", condition.condition);
        } else {
            println!(
                "   - {}: {} trials | adverb RT {:.3} (median {:.3}) | sentence RT {:.3} (median {:.3})",
                condition.condition,
                overall.count,
                overall.adv_rt_mean,
                overall.adv_rt_median,
                overall.sent_rt_mean,
                overall.sent_rt_median
            );
        }
    }
    println!("   Figures: {}", summary.figures.len());
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Analysis complete! Summary saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Write the summary, creating its parent directory if needed.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

/// Load configuration from file or use defaults.
///
/// Also returns the file the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(CONFIG_FILE_NAME))),
        None => (Config::default(), None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_output_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports/summary.md");

        write_output(&path, "# Reading Time Summary\n").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Reading Time Summary"));
    }

    #[test]
    fn test_run_without_plots() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("summary.json");
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/dataMM.txt");

        let args = Args {
            data: Some(fixture),
            figures_dir: Some(temp_dir.path().join("figures")),
            output: Some(output.clone()),
            format: OutputFormat::Json,
            config: None,
            verbose: false,
            quiet: true,
            no_plots: true,
            init_config: false,
        };
        let mut config = Config::default();
        config.merge_with_args(&args);

        run(&args, &config).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["metadata"]["trials"], 24);
        assert_eq!(json["conditions"][0]["condition"], "common");
        assert!(json["figures"].as_array().unwrap().is_empty());
        assert!(!temp_dir.path().join("figures").exists());
    }

    #[test]
    fn test_run_missing_data_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data.path = temp_dir.path().join("missing.txt").display().to_string();
        config.general.output = temp_dir.path().join("out.md").display().to_string();

        let args = Args {
            data: None,
            figures_dir: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: true,
            no_plots: true,
            init_config: false,
        };

        assert!(run(&args, &config).is_err());
    }
}
