//! CLI argument definitions for `tabmap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tabmap_cli::settings::DEFAULT_SETTINGS_FILE;

#[derive(Parser)]
#[command(
    name = "tabmap",
    version,
    about = "Map spreadsheet columns onto the performance data catalog",
    long_about = "Map the columns of a tabular performance export onto the \
                  canonical field catalog.\n\n\
                  Columns are matched automatically where possible; the rest \
                  can be mapped, dismissed or accepted from suggestions before \
                  the rows are previewed and imported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
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

    /// Allow cell values such as player names in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file; a missing file means defaults.
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = DEFAULT_SETTINGS_FILE,
        global = true
    )]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the fields columns can be mapped to.
    Fields,

    /// Show how the columns of a file would be mapped.
    Suggest(SuggestArgs),

    /// Map a file and import its rows.
    Import(ImportArgs),

    /// List or delete learned mapping templates.
    Templates(TemplatesArgs),
}

#[derive(Args)]
pub struct SuggestArgs {
    /// CSV file whose header row is mapped.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON file holding dismissed suggestions between runs.
    #[arg(long = "state", value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Rank the catalog fields for a column, best match first (repeatable).
    #[arg(long = "rank", value_name = "COLUMN")]
    pub rank: Vec<String>,

    /// Ranked fields shown per column.
    #[arg(long = "rank-limit", value_name = "N", default_value_t = 5)]
    pub rank_limit: usize,
}

#[derive(Args)]
pub struct ImportArgs {
    /// CSV file to import.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Map a column to a field (repeatable).
    #[arg(long = "map", value_name = "COLUMN=FIELD")]
    pub map: Vec<String>,

    /// Remove the mapping of a column (repeatable).
    #[arg(long = "unmap", value_name = "COLUMN")]
    pub unmap: Vec<String>,

    /// Dismiss the suggestion for a column (repeatable).
    #[arg(long = "reject", value_name = "COLUMN")]
    pub reject: Vec<String>,

    /// Accept every high-confidence suggestion.
    #[arg(long = "accept-suggestions", conflicts_with = "reject_suggestions")]
    pub accept_suggestions: bool,

    /// Dismiss every pending suggestion.
    #[arg(long = "reject-suggestions")]
    pub reject_suggestions: bool,

    /// Register a custom field and map a column to it (repeatable).
    #[arg(long = "custom", value_name = "LABEL=COLUMN")]
    pub custom: Vec<String>,

    /// Output JSON file (default: <FILE> with a .json extension).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Stop after the preview without writing anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// JSON file holding dismissed suggestions between runs.
    #[arg(long = "state", value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Neither reuse nor learn mapping templates.
    #[arg(long = "no-templates")]
    pub no_templates: bool,
}

#[derive(Args)]
pub struct TemplatesArgs {
    /// Delete the template with this fingerprint instead of listing.
    #[arg(long = "delete", value_name = "FINGERPRINT")]
    pub delete: Option<String>,
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
