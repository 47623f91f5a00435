/*!
 * model-sync CLI - Command Line Interface
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

use clap::{Parser, Subcommand, ValueEnum};
use model_sync::{
    config::{ListingMode, LogLevel, SyncConfig},
    core::{DeploymentHints, DownloadRequest, Orchestrator, UploadReport, UploadRequest},
    error::{Result, SyncError, EXIT_SUCCESS},
    logging,
    prepare::{self, PrepareOutcome},
    protocol::s3::S3Connector,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "model-sync")]
#[command(version, about = "Bulk, parallel transfer of model trees to and from S3-compatible storage", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace) [default: config file, then info]
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Path to log file (default: stderr)
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror every object under a bucket prefix into a local directory
    Download {
        /// Model path (key prefix) inside the bucket [env: MODEL_PATH]
        model_path: Option<String>,

        /// Bucket holding the model [env: MODEL_BUCKET_NAME]
        #[arg(short, long)]
        bucket: Option<String>,

        /// Directory the prefix is recreated under
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,

        /// Number of parallel workers (default: CPU count)
        #[arg(short = 'j', long = "jobs")]
        jobs: Option<usize>,

        /// Issue a single listing call instead of following continuation tokens
        #[arg(long)]
        single_page: bool,
    },

    /// Push every file under a local directory to a bucket prefix
    Upload {
        /// Local directory to upload
        local_dir: PathBuf,

        /// Destination bucket
        bucket: String,

        /// Key prefix the tree lands under
        bucket_path: String,

        /// Number of parallel workers (default: CPU count)
        #[arg(short = 'j', long = "jobs")]
        jobs: Option<usize>,
    },

    /// Export a model locally (unless already done) and upload it
    Prepare {
        /// Model repository name, also used as the bucket path
        model_name: String,

        /// Destination bucket
        bucket: String,

        /// Scratch directory for the exported model
        #[arg(long, default_value = prepare::DEFAULT_DESTDIR)]
        destdir: PathBuf,

        /// Number of parallel workers (default: CPU count)
        #[arg(short = 'j', long = "jobs")]
        jobs: Option<usize>,

        /// Command that exports the model [env: MODEL_EXPORTER]
        #[arg(long)]
        exporter: Option<String>,

        /// Print deployment hints as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}", error_message(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // File first, then environment, then flags
    let mut config = match cli.config {
        Some(ref config_path) => SyncConfig::from_file(config_path)?,
        None => SyncConfig::default(),
    };
    config.apply_process_env();
    apply_log_flags(&mut config, &cli);

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| SyncError::Parallel(format!("Failed to start async runtime: {}", e)))?;

    runtime.block_on(handle_command(cli.command, config))
}

/// Logging flags only override the config file when given
fn apply_log_flags(config: &mut SyncConfig, cli: &Cli) {
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    if cli.verbose {
        config.verbose = true;
    }
}

fn error_message(e: &SyncError) -> String {
    let mut message = format!("Error [{}]: {}", e.category(), e);
    if e.is_fatal() {
        message.push_str("\nNo files were transferred");
    }
    message
}

async fn handle_command(command: Commands, mut config: SyncConfig) -> Result<()> {
    match command {
        Commands::Download {
            model_path,
            bucket,
            dest,
            jobs,
            single_page,
        } => {
            if let Some(jobs) = jobs {
                config.parallelism = jobs;
            }
            if single_page {
                config.listing_mode = ListingMode::SinglePage;
            }
            let bucket = bucket.or_else(|| config.bucket.clone()).ok_or_else(|| {
                SyncError::Config("Bucket required (--bucket or MODEL_BUCKET_NAME)".to_string())
            })?;
            let prefix = model_path.or_else(|| config.model_path.clone()).ok_or_else(|| {
                SyncError::Config("Model path required (argument or MODEL_PATH)".to_string())
            })?;
            config.bucket = Some(bucket.clone());
            config.validate()?;

            let orchestrator = orchestrator(&config)?;
            let report = orchestrator
                .download(&DownloadRequest {
                    bucket,
                    prefix,
                    dest_dir: dest,
                })
                .await?
                .into_result()?;

            println!(
                "Downloaded {} objects to {} in {:.1}s",
                report.summary.succeeded,
                report.local_root.display(),
                report.duration.as_secs_f64()
            );
            Ok(())
        }

        Commands::Upload {
            local_dir,
            bucket,
            bucket_path,
            jobs,
        } => {
            if let Some(jobs) = jobs {
                config.parallelism = jobs;
            }
            config.bucket = Some(bucket.clone());
            config.validate()?;

            let report = orchestrator(&config)?
                .upload(&UploadRequest {
                    bucket,
                    bucket_path,
                    local_dir,
                })
                .await?
                .into_result()?;

            print_hints(&report, &config, false)
        }

        Commands::Prepare {
            model_name,
            bucket,
            destdir,
            jobs,
            exporter,
            json,
        } => {
            if let Some(jobs) = jobs {
                config.parallelism = jobs;
            }
            if exporter.is_some() {
                config.exporter = exporter;
            }
            config.bucket = Some(bucket.clone());
            config.validate()?;

            let options = config.engine_options();
            eprintln!("using these settings:");
            eprintln!("* model repo:                   {}", model_name);
            eprintln!("* bucket name:                  {}", bucket);
            eprintln!("* temporary model storage dir:  {}", destdir.display());
            eprintln!("* parallel upload jobs:         {}", options.parallelism);

            match prepare::prepare_model(&model_name, &destdir, config.exporter.as_deref()).await? {
                PrepareOutcome::Exported => eprintln!("model exported to {}", destdir.display()),
                PrepareOutcome::AlreadyPrepared => {
                    eprintln!("model already prepared, skipping the export step")
                }
            }

            let report = orchestrator(&config)?
                .upload(&UploadRequest {
                    bucket,
                    bucket_path: model_name,
                    local_dir: destdir,
                })
                .await?
                .into_result()?;

            print_hints(&report, &config, json)
        }
    }
}

fn orchestrator(config: &SyncConfig) -> Result<Orchestrator<S3Connector>> {
    let connector = S3Connector::new(config.store.clone())
        .map_err(|e| SyncError::Config(e.to_string()))?;
    Ok(Orchestrator::new(connector, config.engine_options()))
}

fn print_hints(report: &UploadReport, config: &SyncConfig, json: bool) -> Result<()> {
    let hints: DeploymentHints = report.hints(&config.store);

    if json {
        println!("{}", serde_json::to_string_pretty(&hints)?);
        return Ok(());
    }

    println!(
        "Uploaded {} files to s3://{}/{} in {:.1}s",
        report.summary.succeeded,
        report.bucket,
        hints.model_path,
        report.duration.as_secs_f64()
    );
    println!();
    println!("use the following environment variables in your deployment:");
    println!();
    for line in hints.env_lines() {
        println!("  {}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_with_level(level: LogLevel) -> SyncConfig {
        SyncConfig {
            log_level: level,
            log_file: Some(PathBuf::from("from-config.log")),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn test_config_log_level_kept_without_flag() {
        let cli =
            Cli::try_parse_from(["model-sync", "upload", "local_setup", "models", "flux"]).unwrap();
        let mut config = config_with_level(LogLevel::Warn);

        apply_log_flags(&mut config, &cli);

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_file.as_deref(), Some(Path::new("from-config.log")));
        assert!(!config.verbose);
    }

    #[test]
    fn test_log_level_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "model-sync",
            "upload",
            "local_setup",
            "models",
            "flux",
            "--log-level",
            "trace",
            "--log",
            "run.log",
        ])
        .unwrap();
        let mut config = config_with_level(LogLevel::Warn);

        apply_log_flags(&mut config, &cli);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.log_file.as_deref(), Some(Path::new("run.log")));
    }

    #[test]
    fn test_error_message_names_category() {
        let fatal = SyncError::Config("Bucket required".to_string());
        assert_eq!(
            error_message(&fatal),
            "Error [configuration]: Configuration error: Bucket required\nNo files were transferred"
        );

        let partial = SyncError::Incomplete {
            succeeded: 2,
            attempted: 3,
            total: 3,
            first_error: Box::new(SyncError::Parallel("worker panicked".to_string())),
        };
        let message = error_message(&partial);
        assert!(message.starts_with("Error [concurrency]: "));
        assert!(!message.contains("No files were transferred"));
    }
}
