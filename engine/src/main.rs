//! filefilter CLI - split a data file into accepted and rejected records
//!
//! # Commands
//!
//! ```bash
//! filefilter run                          # Run with ./filter-config.yaml
//! filefilter run jobs/daily.yaml --json   # Print the result as JSON
//! filefilter check jobs/daily.yaml        # Validate a configuration only
//! ```

use clap::{Parser, Subcommand};
use filefilter::config::DEFAULT_CONFIG_FILE;
use filefilter::logs::{self, log_error, log_info, log_success, log_warning};
use filefilter::{process, FileFormat, FilterConfig};
use std::path::{Path, PathBuf};

const BANNER_WIDTH: usize = 60;

#[derive(Parser)]
#[command(name = "filefilter", version)]
#[command(about = "Filter CSV, TXT and spreadsheet files against column rules", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the filter described by a configuration file
    Run {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the processing result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file without processing
    Check {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logs::init(&cli.log_level);

    let result = match cli.command {
        Commands::Run {
            config,
            output_dir,
            json,
        } => cmd_run(&config, output_dir, json),

        Commands::Check { config } => cmd_check(&config),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_run(
    config_path: &Path,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = FilterConfig::load(config_path)?;
    if let Some(dir) = output_dir {
        config.output.directory = dir;
    }

    banner("File Filter");
    let format = config.validate()?;
    print_summary(&config, format);

    let result = process(&config)?;

    banner("Processing Complete");
    log_success(format!("Total records:    {}", result.total_records));
    log_success(format!("Accepted records: {}", result.success_records));
    log_success(format!("Rejected records: {}", result.reject_records));
    log_info(format!("Processing time:  {} ms", result.processing_time_ms()));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = FilterConfig::load(config_path)?;
    let format = config.validate()?;
    print_summary(&config, format);
    log_success(format!("Configuration '{}' is valid", config_path.display()));
    Ok(())
}

fn banner(title: &str) {
    log_info("=".repeat(BANNER_WIDTH));
    log_info(title);
    log_info("=".repeat(BANNER_WIDTH));
}

fn print_summary(config: &FilterConfig, format: FileFormat) {
    log_info(format!("Input file:        {}", config.input_file.display()));
    log_info(format!(
        "File type:         {} ({})",
        config.file_type.trim().to_uppercase(),
        format.processor_name()
    ));
    if format.is_text() {
        log_info(format!("Encoding:          {}", config.encoding));
    }
    if format == FileFormat::FixedDelimiter {
        log_info(format!("Delimiter:         '{}'", config.delimiter));
    }
    log_info(format!("Header lines:      {}", config.skip_header_lines));
    if let Some(expected) = config.expected_total_column {
        log_info(format!("Expected columns:  {}", expected));
    }
    log_info(format!("Validation rules:  {}", config.validations.len()));

    match config.output_paths(format) {
        Ok(paths) => {
            log_info(format!("Filtered output:   {}", paths.filtered.display()));
            match paths.rejected {
                Some(rejected) => log_info(format!("Rejected output:   {}", rejected.display())),
                None => log_info("Rejected output:   (discarded)"),
            }
        }
        Err(e) => log_warning(format!("Output: {}", e)),
    }
}
