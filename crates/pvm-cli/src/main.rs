//! Protocol version manager CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use pvm_cli::cli::{Cli, LogFormatArg, LogLevelArg};
use pvm_cli::commands::execute;
use pvm_cli::logging::{LogConfig, LogFormat, init_logging};
use pvm_lifecycle::LifecycleError;
use pvm_persistence::PersistenceError;
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start async runtime: {error}");
            std::process::exit(1);
        }
    };

    let exit_code = match runtime.block_on(execute(&cli.command, &cli.store)) {
        Ok(output) => {
            println!("{output}");
            0
        }
        Err(error) => {
            report_error(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

/// Print the most helpful message available for `error`.
fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<LifecycleError>() {
        Some(lifecycle) => eprintln!("error: {}", lifecycle.user_message()),
        None => eprintln!("error: {error:#}"),
    }
    let hint = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<PersistenceError>())
        .and_then(PersistenceError::suggestion);
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
