//! Command line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use opsdash_store::DEFAULT_DATABASE_FILE;
use opsdash_store::passphrase::DEFAULT_PASSPHRASE_VAR;

#[derive(Parser)]
#[command(
    name = "opsdash",
    version,
    about = "Operations dashboard backend - Sage 100 sync, job scheduler and sales reports",
    long_about = "Keeps an encrypted local copy of Sage 100 sales data.\n\n\
                  Customers, invoice history and items are pulled over ODBC into a\n\
                  SQLCipher database, on demand or on a schedule, and reported from there."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Encrypted database file.
    #[arg(
        long,
        value_name = "PATH",
        env = "OPSDASH_DATABASE",
        default_value = DEFAULT_DATABASE_FILE,
        global = true
    )]
    pub database: PathBuf,

    /// Environment variable holding the database passphrase.
    #[arg(
        long = "passphrase-env",
        value_name = "VAR",
        default_value = DEFAULT_PASSPHRASE_VAR,
        global = true
    )]
    pub passphrase_env: String,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for log collectors).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow customer and order values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the encrypted database and store the Sage connection settings.
    Init(InitArgs),

    /// Pull every mapped Sage table once.
    Sync(SyncArgs),

    /// Run the scheduled jobs until interrupted.
    Serve(ServeArgs),

    /// List scheduled jobs and their last run.
    Jobs,

    /// Show the table mappings a sync would use.
    Mappings(MappingsArgs),

    /// Reports over the synced data.
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Args)]
pub struct InitArgs {
    /// ODBC data source name of the Sage 100 installation.
    #[arg(long, value_name = "DSN")]
    pub dsn: String,

    /// Sage company code.
    #[arg(long, value_name = "CODE")]
    pub company: String,

    /// Sage server host name.
    #[arg(long, value_name = "HOST")]
    pub server: String,

    /// Sage database name.
    #[arg(long = "sage-database", value_name = "NAME")]
    pub sage_database: String,

    /// Sage user the sync connects as.
    #[arg(long = "sage-user", value_name = "USER")]
    pub sage_user: String,

    /// Environment variable holding the Sage user's password.
    #[arg(long = "sage-password-env", value_name = "VAR", default_value = "SAGE_PASSWORD")]
    pub sage_password_env: String,

    /// US sieve sizes shown by default on sieve tests (comma separated).
    #[arg(long = "sieve", value_name = "SIZES", value_delimiter = ',')]
    pub sieves: Vec<i64>,

    /// Sample product name; repeat for several.
    #[arg(long = "sample", value_name = "NAME")]
    pub samples: Vec<String>,
}

#[derive(Args)]
pub struct MappingSource {
    /// JSON file with table mappings (default: the built-in Sage tables).
    #[arg(long = "mappings", value_name = "FILE")]
    pub mappings: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: MappingSource,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: MappingSource,

    /// Wall-clock limit of one job run, in seconds.
    #[arg(long = "job-timeout", value_name = "SECS", default_value_t = 3600)]
    pub job_timeout: u64,

    /// Delay before the first run of each job, in seconds.
    #[arg(long = "first-run-delay", value_name = "SECS", default_value_t = 10)]
    pub first_run_delay: u64,
}

#[derive(Args)]
pub struct MappingsArgs {
    #[command(flatten)]
    pub source: MappingSource,

    /// Print the mappings as JSON, in the mapping file format.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Invoice lines, item and yearly totals for a date range.
    Sales(SalesArgs),
}

#[derive(Args)]
pub struct SalesArgs {
    /// First order date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: NaiveDate,

    /// Last order date, inclusive (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub end: NaiveDate,

    /// Also export the lines to this CSV file.
    #[arg(long = "csv", value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
