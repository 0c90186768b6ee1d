//! Outcome counters for a report run

use crate::error::SourceKind;
use std::collections::HashMap;
use std::time::Duration;

/// Counters collected while a report runs
///
/// Tracks how many domains produced a row, which adapters failed and how
/// long the run took.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Domains requested
    pub domains: usize,

    /// Domains that produced a scored row
    pub succeeded: usize,

    /// Failures per adapter
    pub failures: HashMap<SourceKind, usize>,

    /// Whether user counts were dropped because analytics failed
    pub degraded_visits: bool,

    /// Wall-clock duration of the run
    pub runtime: Duration,
}

impl RunSummary {
    /// Create counters for a run over `domains` domains
    pub fn new(domains: usize) -> Self {
        Self {
            domains,
            ..Default::default()
        }
    }

    /// Record a domain that produced a row
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record an adapter failure
    pub fn record_failure(&mut self, kind: SourceKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    /// Record that the run continued without user counts
    pub fn record_degraded_visits(&mut self, kind: SourceKind) {
        self.degraded_visits = true;
        self.record_failure(kind);
    }

    /// Total failures across all adapters
    pub fn total_failed(&self) -> usize {
        self.failures.values().sum()
    }

    /// Domains that did not produce a row
    pub fn domains_failed(&self) -> usize {
        self.domains.saturating_sub(self.succeeded)
    }

    /// Whether every domain produced a row with full data
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Run Summary".to_string(),
            "===========".to_string(),
            format!("Domains: {}", self.domains),
            format!("Reported: {}", self.succeeded),
            format!("Failed: {}", self.domains_failed()),
            format!("Runtime: {:.2}s", self.runtime.as_secs_f64()),
        ];

        if self.degraded_visits {
            lines.push("Active users unavailable: analytics failed".to_string());
        }

        if !self.failures.is_empty() {
            lines.push(String::new());
            lines.push("Failures by source:".to_string());
            let mut kinds: Vec<_> = self.failures.iter().collect();
            kinds.sort_by_key(|(kind, _)| kind.as_str());
            for (kind, count) in kinds {
                lines.push(format!("  {}: {}", kind, count));
            }
            lines.push(format!("  Total: {}", self.total_failed()));
        }

        lines.join("\n")
    }
}
