//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use quinta_domain::{ActiveUsers, Confidence, Domain, ScoredRow};
use quinta_engine::{DomainFailure, RunReport};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Columns, object::Rows, Alignment, Modify, Panel, Style},
};

/// Report column headings, in display order.
pub const COLUMNS: [&str; 10] = [
    "Domain",
    "Up",
    "Words",
    "Clicks",
    "Impressions",
    "Position",
    "Min CTR",
    "Google Tag ID",
    "Users 28d",
    "Score",
];

/// A report line: a scored row or a domain that failed.
enum Line<'a> {
    Scored(&'a ScoredRow),
    Failed(&'a Domain, &'a DomainFailure),
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a completed report.
    ///
    /// Rows follow input order unless `rank` is set, in which case scored
    /// rows are ordered by descending score and failed domains come last.
    pub fn format_report(&self, report: &RunReport, rank: bool) -> Result<String> {
        let lines = report_lines(report, rank);
        match self.format {
            OutputFormat::Json => self.format_report_json(&lines),
            OutputFormat::Table => Ok(self.format_report_table(&lines)),
            OutputFormat::Quiet => Ok(self.format_report_quiet(&lines)),
        }
    }

    /// Format the report as JSON.
    fn format_report_json(&self, lines: &[Line<'_>]) -> Result<String> {
        let rows: Vec<Value> = lines
            .iter()
            .map(|line| match line {
                Line::Scored(row) => {
                    let record = &row.record;
                    json!({
                        "domain": record.domain().as_str(),
                        "up": record.up(),
                        "words": record.word_count(),
                        "clicks": record.clicks(),
                        "impressions": record.impressions(),
                        "position": record.position(),
                        "min_ctr_pct": record.ctr_lower_bound_pct(),
                        "google_tag_id": record.tag_id().map(|t| t.as_str()),
                        "users_28d": record.active_users().count(),
                        "score": row.score
                    })
                }
                Line::Failed(domain, failure) => json!({
                    "domain": domain.as_str(),
                    "error": {
                        "source": failure.kind.as_str(),
                        "message": failure.message
                    }
                }),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Format the report as a table.
    fn format_report_table(&self, lines: &[Line<'_>]) -> String {
        if lines.is_empty() {
            return self.colorize("No domains to report.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(COLUMNS);

        for line in lines {
            match line {
                Line::Scored(row) => builder.push_record(row_cells(row)),
                Line::Failed(domain, _) => {
                    let mut cells = vec!["-".to_string(); COLUMNS.len()];
                    cells[0] = domain.to_string();
                    builder.push_record(cells);
                }
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..7)).with(Alignment::right()))
            .with(Modify::new(Columns::last()).with(Alignment::right()))
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Panel::header("Websites"));

        table.to_string()
    }

    /// Format the report in quiet mode (domain and score).
    fn format_report_quiet(&self, lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .filter_map(|line| match line {
                Line::Scored(row) => Some(format!("{}\t{}", row.record.domain(), row.score)),
                Line::Failed(..) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Describe failed domains and degraded sources, if there were any.
    pub fn failure_summary(&self, report: &RunReport) -> Option<String> {
        let failures: Vec<_> = report.failures().collect();
        if failures.is_empty() && report.run_failures.is_empty() {
            return None;
        }

        let mut lines = Vec::new();
        if !failures.is_empty() {
            lines.push(self.error(&format!("{} domain(s) failed:", failures.len())));
            for (domain, failure) in failures {
                lines.push(format!("  {}: {}", domain, failure));
            }
        }
        for failure in &report.run_failures {
            lines.push(self.warning(&format!("Active users unavailable ({})", failure)));
        }
        Some(lines.join("\n"))
    }

    /// Format a Wilson interval for `clicks` out of `impressions`.
    pub fn format_confidence(&self, clicks: u64, impressions: u64, confidence: &Confidence) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let interval = confidence.interval();
                let value = json!({
                    "clicks": clicks,
                    "impressions": impressions,
                    "lower": interval.map(|ci| ci.lower),
                    "upper": interval.map(|ci| ci.upper)
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(format!("{}", confidence.lower())),
            OutputFormat::Table => Ok(match confidence.interval() {
                Some(ci) => format!(
                    "{} clicks / {} impressions\n95% interval: [{:.4}, {:.4}]\nMin CTR: {:.2}%",
                    clicks,
                    impressions,
                    ci.lower,
                    ci.upper,
                    ci.lower * 100.0
                ),
                None => self.warning("No impressions: the interval is undefined"),
            }),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn report_lines(report: &RunReport, rank: bool) -> Vec<Line<'_>> {
    if rank {
        let mut lines: Vec<Line<'_>> = report.ranked().into_iter().map(Line::Scored).collect();
        lines.extend(report.failures().map(|(d, f)| Line::Failed(d, f)));
        return lines;
    }

    report
        .domains
        .iter()
        .map(|d| match &d.outcome {
            Ok(row) => Line::Scored(row),
            Err(failure) => Line::Failed(&d.domain, failure),
        })
        .collect()
}

fn row_cells(row: &ScoredRow) -> Vec<String> {
    let record = &row.record;
    vec![
        record.domain().to_string(),
        if record.up() { "✅" } else { "❌" }.to_string(),
        record.word_count().to_string(),
        record.clicks().to_string(),
        record.impressions().to_string(),
        format!("{:.1}", record.position()),
        format!("{:.2}%", record.ctr_lower_bound_pct()),
        record
            .tag_id()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "❌".to_string()),
        format_users(record.active_users()),
        row.score.to_string(),
    ]
}

/// Format an active-user count for display.
pub fn format_users(users: ActiveUsers) -> String {
    match users {
        ActiveUsers::Count(n) => n.to_string(),
        ActiveUsers::Unavailable => "N/A".to_string(),
    }
}
