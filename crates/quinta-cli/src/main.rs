//! Quinta CLI - Health and performance report for a portfolio of websites.

use anyhow::Context;
use clap::Parser;
use quinta_cli::cli::ReportArgs;
use quinta_cli::commands;
use quinta_cli::config::OutputFormat;
use quinta_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        // Init writes the file the other commands read
        Some(Command::Init(args)) => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::path()?,
            };
            let format = cli.format.map(Into::into).unwrap_or(OutputFormat::Table);
            let formatter = Formatter::new(format, !cli.no_color);
            commands::execute_init(args, &path, &formatter)?;
        }
        command => {
            let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

            // Determine output format
            let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

            // Determine color setting
            let color_enabled = !cli.no_color && config.settings.color;

            // Create formatter
            let formatter = Formatter::new(format, color_enabled);

            match command {
                Some(Command::Confidence(args)) => commands::execute_confidence(args, &formatter)?,
                Some(Command::Report(args)) => commands::execute_report(args, &config, &formatter).await?,
                _ => commands::execute_report(ReportArgs::default(), &config, &formatter).await?,
            }
        }
    }

    Ok(())
}
