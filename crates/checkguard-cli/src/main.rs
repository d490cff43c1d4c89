mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use crate::commands::{blocklist, completions, Context};
use crate::error::{exit_code_for, report_error};
use checkguard_config as config;
use checkguard_store::{paths, PoolOptions, Store};

#[derive(Debug, Parser)]
#[command(
    name = "checkguard",
    version,
    about = "Blocked phone number registry for check acceptance"
)]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Block a number, or record another incident for one already blocked
    Block(blocklist::BlockArgs),
    /// Check whether a number is blocked
    #[command(visible_alias = "search")]
    Lookup(blocklist::LookupArgs),
    /// Remove a number from the blocklist
    Unblock(blocklist::UnblockArgs),
    /// List blocked numbers, newest first
    List(blocklist::ListArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    if let Command::Completions(args) = command {
        return completions::emit(args);
    }

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }

    let db_path = paths::resolve_db_path(db_path.or_else(|| app_config.database.path.clone()))
        .with_context(|| "resolve database path")?;
    let options = pool_options(&app_config.database);
    debug!(
        path = %db_path.display(),
        max_connections = options.max_connections,
        "database path resolved"
    );

    let store = Store::open_with(&db_path, &options)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        json,
    };

    match command {
        Command::Block(args) => blocklist::block_number(&ctx, args),
        Command::Lookup(args) => blocklist::lookup_number(&ctx, args),
        Command::Unblock(args) => blocklist::unblock_number(&ctx, args),
        Command::List(args) => blocklist::list_numbers(&ctx, args),
        Command::Completions(_) => {
            unreachable!("completions command handled before store initialization")
        }
    }
}

fn pool_options(database: &config::DatabaseConfig) -> PoolOptions {
    PoolOptions {
        max_connections: database.max_connections,
        min_idle: Some(database.min_idle),
        max_lifetime: Some(Duration::from_secs(database.max_lifetime_secs)),
        connection_timeout: Duration::from_secs(database.connection_timeout_secs),
        busy_timeout: Duration::from_millis(database.busy_timeout_ms),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
