use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use spdlog::{Level, LevelFilter, error, info};
use std::{error::Error, path::PathBuf, process::ExitCode};

mod api;
mod fixture;
mod loader;
mod report;
mod store;

use crate::api::ApiClient;
use crate::fixture::REPORTS;
use crate::loader::Loader;
use crate::store::{DocumentStore, FileStore, HttpStore, MemoryStore};

/// Seeds a document store with the reports test fixture
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Where the collection lives
    #[arg(long, env = "SEED_BACKEND", value_enum, default_value_t = Backend::File)]
    backend: Backend,

    #[arg(long, env = "SEED_COLLECTION", default_value = "reports")]
    collection: String,

    /// Root directory of the file backend
    #[arg(long, env = "SEED_DATA_DIR", default_value = "seed-data")]
    data_dir: PathBuf,

    /// Base URL of the Data API endpoint (http backend)
    #[arg(long, env = "SEED_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "SEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "SEED_DATA_SOURCE", default_value = "mongodb-atlas")]
    data_source: String,

    #[arg(long, env = "SEED_DATABASE", default_value = "test")]
    database: String,

    /// More output, repeat for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Create the collection and insert the fixture (fails if it already exists)
    Load,
    /// Compare the collection with the fixture, exits non-zero on any difference
    Verify,
    /// Drop the collection
    Reset,
    /// Print the fixture as JSON
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process only, useful as a dry run
    Memory,
    File,
    Http,
}

// the part of `Command` that needs a store
#[derive(Debug, Clone, Copy)]
enum StoreCommand {
    Load,
    Verify,
    Reset,
}

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("--{0} is required by the http backend")]
    Missing(&'static str),

    #[error("cannot install logger: {0}")]
    Logger(String),
}

fn init_logging(verbose: u8, quiet: bool) -> Result<(), ConfigError> {
    let level = match (quiet, verbose) {
        (true, _) => Level::Warn,
        (false, 0) => Level::Info,
        (false, 1) => Level::Debug,
        (false, _) => Level::Trace,
    };
    spdlog::default_logger().set_level_filter(LevelFilter::MoreSevereEqual(level));

    // route `log` records (reqwest, hyper) through spdlog
    spdlog::init_log_crate_proxy().map_err(|e| ConfigError::Logger(e.to_string()))?;
    log::set_max_level(match level {
        Level::Warn => log::LevelFilter::Warn,
        Level::Info => log::LevelFilter::Info,
        Level::Debug => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });

    Ok(())
}

async fn run<S: DocumentStore>(
    store: &S,
    command: StoreCommand,
    args: &Args,
) -> Result<ExitCode, Box<dyn Error>> {
    let loader = Loader::new(store, args.collection.clone(), REPORTS);

    match command {
        StoreCommand::Load => {
            loader.load().await?;
            if args.backend == Backend::Memory {
                let verification = loader.verify().await?;
                info!("Dry run: {} of {} records stored", verification.found, verification.expected);
            }
        }
        StoreCommand::Verify => {
            let verification = loader.verify().await?;
            if !verification.is_exact() {
                error!(
                    "Collection {} differs from fixture {}: {} found, {} expected, {} missing, {} unexpected",
                    args.collection,
                    REPORTS,
                    verification.found,
                    verification.expected,
                    verification.missing.len(),
                    verification.unexpected.len()
                );
                return Ok(ExitCode::FAILURE);
            }
            info!("Collection {} matches fixture {}", args.collection, REPORTS);
        }
        StoreCommand::Reset => {
            loader.reset().await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn show() -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(&REPORTS.records()?)?);
    Ok(())
}

async fn dispatch(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let command = match args.command {
        // nothing to connect to
        Command::Show => {
            show()?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Load => StoreCommand::Load,
        Command::Verify => StoreCommand::Verify,
        Command::Reset => StoreCommand::Reset,
    };

    match args.backend {
        Backend::Memory => run(&MemoryStore::new(), command, args).await,
        Backend::File => run(&FileStore::open(&args.data_dir).await?, command, args).await,
        Backend::Http => {
            let url = args.api_url.as_deref().ok_or(ConfigError::Missing("api-url"))?;
            let key = args.api_key.clone().ok_or(ConfigError::Missing("api-key"))?;
            let client = ApiClient::new(url, key)?;
            let store = HttpStore::new(client, args.data_source.clone(), args.database.clone());

            run(&store, command, args).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet)?;

    match dispatch(&args).await {
        Ok(code) => Ok(code),
        Err(err) => {
            error!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["report-seed", "load"]).unwrap();

        assert_eq!(args.backend, Backend::File);
        assert_eq!(args.collection, "reports");
        assert!(matches!(args.command, Command::Load));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = Args::try_parse_from(["report-seed", "-v", "-q", "verify"]);

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_backend_requires_url() {
        // Given
        let args =
            Args::try_parse_from(["report-seed", "--backend", "http", "--api-key", "key", "load"])
                .unwrap();

        // When
        let result = dispatch(&args).await;

        // Then
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "--api-url is required by the http backend");
    }

    #[tokio::test]
    async fn test_memory_load_then_verify_exit_codes() {
        let args = Args::try_parse_from(["report-seed", "--backend", "memory", "load"]).unwrap();
        assert_eq!(dispatch(&args).await.unwrap(), ExitCode::SUCCESS);

        // a fresh in-memory store has no collection to verify
        let args = Args::try_parse_from(["report-seed", "--backend", "memory", "verify"]).unwrap();
        assert!(dispatch(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_file_backend_load_verify_reset() {
        let dir = tempfile::TempDir::new().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let parse = |command: &str| {
            Args::try_parse_from(["report-seed", "--data-dir", data_dir, command]).unwrap()
        };

        assert_eq!(dispatch(&parse("load")).await.unwrap(), ExitCode::SUCCESS);
        assert!(dispatch(&parse("load")).await.is_err());
        assert_eq!(dispatch(&parse("verify")).await.unwrap(), ExitCode::SUCCESS);
        assert_eq!(dispatch(&parse("reset")).await.unwrap(), ExitCode::SUCCESS);
        assert!(dispatch(&parse("verify")).await.is_err());
    }

    #[tokio::test]
    async fn test_show_does_not_open_the_store() {
        // Given
        let dir = tempfile::TempDir::new().unwrap();
        let data_dir = dir.path().join("never-created");
        let args = Args::try_parse_from([
            "report-seed",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "show",
        ])
        .unwrap();

        // When
        let code = dispatch(&args).await.unwrap();

        // Then
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(!data_dir.exists());
    }

    #[test]
    fn test_logger_can_only_be_installed_once() {
        // nothing else in the test binary installs one
        let _ = init_logging(0, true);

        let result = init_logging(0, true);

        assert!(matches!(result, Err(ConfigError::Logger(_))));
    }
}
