use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, LevelFilter},
    fmt::{self},
    prelude::*,
};

/// Environment variable holding extra filter directives, e.g. `foldkit=trace`.
pub const LOG_ENV: &str = "FOLDKIT_LOG";

/// HTTP stack crates that are only interesting when explicitly requested.
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper_util=warn", "reqwest=warn", "h2=warn"];

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn build_filter(verbosity: u8, quiet: bool) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(level_filter(verbosity, quiet).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    for directive in QUIET_DEPENDENCIES {
        let directive: Directive = directive
            .parse()
            .map_err(|e| CliError::Config(format!("Invalid log directive '{}': {}", directive, e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = build_filter(verbosity, quiet)?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    if let Some(path) = log_file {
        let file = File::create(&path).map_err(CliError::Io)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
