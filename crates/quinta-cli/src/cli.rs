//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quinta - Health and performance report for a portfolio of websites.
#[derive(Debug, Parser)]
#[command(name = "quinta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "QUINTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (domain and score only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, score and print the report (default)
    Report(ReportArgs),

    /// Print the 95% Wilson interval for a click-through rate
    Confidence(ConfidenceArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the report command.
#[derive(Debug, Default, Args)]
pub struct ReportArgs {
    /// Domain to report on (repeatable, replaces the configured list)
    #[arg(short, long = "domain")]
    pub domains: Vec<String>,

    /// Abort the whole run on the first source failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Maximum number of domains fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Order rows by descending score instead of input order
    #[arg(short, long)]
    pub rank: bool,
}

/// Arguments for the confidence command.
#[derive(Debug, Args)]
pub struct ConfidenceArgs {
    /// Number of clicks
    pub clicks: u64,

    /// Number of impressions
    pub impressions: u64,
}

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["quinta"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_report_command() {
        let cli = Cli::parse_from([
            "quinta",
            "report",
            "--domain",
            "example.com",
            "-d",
            "example.org",
            "--fail-fast",
            "--rank",
        ]);
        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.domains, ["example.com", "example.org"]);
                assert!(args.fail_fast);
                assert!(args.rank);
                assert!(args.concurrency.is_none());
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_confidence_command() {
        let cli = Cli::parse_from(["quinta", "confidence", "10", "100"]);
        match cli.command {
            Some(Command::Confidence(args)) => {
                assert_eq!(args.clicks, 10);
                assert_eq!(args.impressions, 100);
            }
            _ => panic!("Expected Confidence command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["quinta", "report", "-f", "json", "--no-color", "-vv"]);
        assert_eq!(cli.format, Some(CliFormat::Json));
        assert!(cli.no_color);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_format_conversion() {
        let format: crate::config::OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, crate::config::OutputFormat::Quiet);
    }
}
