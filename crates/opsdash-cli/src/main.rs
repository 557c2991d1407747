//! Operations dashboard CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use opsdash_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, ReportCommand};
use opsdash_cli::logging::{LogConfig, LogFormat, init_logging};
use opsdash_cli::summary::print_sync_summary;

mod commands;

use crate::commands::{
    run_init, run_jobs, run_mappings, run_sales_report, run_serve, run_sync,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let outcome = match &cli.command {
        Command::Init(args) => run_init(&cli, args).map(|()| 0),
        Command::Sync(args) => run_sync(&cli, &args.source).map(|run| {
            print_sync_summary(&run);
            if run.succeeded() { 0 } else { 1 }
        }),
        Command::Serve(args) => run_serve(&cli, args).map(|()| 0),
        Command::Jobs => run_jobs(&cli).map(|()| 0),
        Command::Mappings(args) => run_mappings(args).map(|()| 0),
        Command::Report(ReportCommand::Sales(args)) => run_sales_report(&cli, args).map(|()| 0),
    };
    let exit_code = match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
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
    // Timestamps for the scheduler and for log files.
    config.with_timestamps = matches!(cli.command, Command::Serve(_)) || cli.log_file.is_some();
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
