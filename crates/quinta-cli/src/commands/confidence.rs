//! Confidence command implementation.

use crate::cli::ConfidenceArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use quinta_domain::confidence_interval;

/// Execute the confidence command.
pub fn execute_confidence(args: ConfidenceArgs, formatter: &Formatter) -> Result<()> {
    if args.clicks > args.impressions {
        return Err(CliError::InvalidInput(format!(
            "Clicks ({}) cannot exceed impressions ({})",
            args.clicks, args.impressions
        )));
    }

    let confidence = confidence_interval(args.clicks, args.impressions);
    println!(
        "{}",
        formatter.format_confidence(args.clicks, args.impressions, &confidence)?
    );

    Ok(())
}
