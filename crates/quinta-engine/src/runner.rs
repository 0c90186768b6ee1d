//! Report runs over an ordered list of domains

use crate::aggregator::Aggregator;
use crate::cache::{CacheStats, MetricsCache};
use crate::error::{EngineError, SourceKind};
use crate::summary::RunSummary;
use crate::EngineConfig;
use futures::stream::{self, StreamExt};
use quinta_domain::{Domain, ScoredRow};
use quinta_sources::{MetricSource, SourceError};
use std::fmt;
use std::time::Instant;

/// Why a domain (or the whole-run analytics fetch) produced no data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFailure {
    /// Failing adapter
    pub kind: SourceKind,
    /// Description of the underlying error
    pub message: String,
}

impl From<&EngineError> for DomainFailure {
    fn from(err: &EngineError) -> Self {
        let source: &SourceError = match err {
            EngineError::Authentication(source)
            | EngineError::Source { source, .. }
            | EngineError::RunSource { source, .. } => source,
        };
        Self {
            kind: err.kind(),
            message: source.to_string(),
        }
    }
}

impl fmt::Display for DomainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One input domain and what the run produced for it
#[derive(Debug, Clone, PartialEq)]
pub struct DomainReport {
    /// Requested domain
    pub domain: Domain,
    /// Scored row, or the failure that prevented it
    pub outcome: Result<ScoredRow, DomainFailure>,
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per input domain, in input order
    pub domains: Vec<DomainReport>,
    /// Whole-run failures the run continued past
    pub run_failures: Vec<DomainFailure>,
    /// Outcome counters
    pub summary: RunSummary,
    /// Cache occupancy at the end of the run
    pub cache: CacheStats,
}

impl RunReport {
    /// Successful rows in input order
    pub fn rows(&self) -> impl Iterator<Item = &ScoredRow> {
        self.domains.iter().filter_map(|d| d.outcome.as_ref().ok())
    }

    /// Successful rows by descending score; ties keep input order
    pub fn ranked(&self) -> Vec<&ScoredRow> {
        let mut rows: Vec<&ScoredRow> = self.rows().collect();
        rows.sort_by(|a, b| b.score.total_cmp(&a.score));
        rows
    }

    /// Failed domains with their failure
    pub fn failures(&self) -> impl Iterator<Item = (&Domain, &DomainFailure)> {
        self.domains
            .iter()
            .filter_map(|d| d.outcome.as_ref().err().map(|f| (&d.domain, f)))
    }

    /// Whether every domain produced a row and no whole-run fetch failed
    pub fn is_complete(&self) -> bool {
        self.run_failures.is_empty() && self.domains.iter().all(|d| d.outcome.is_ok())
    }
}

/// Runs reports against a metric source
///
/// Each call to [`run`](ReportRunner::run) starts with a fresh cache, fetches
/// up to `concurrency` domains at a time and emits results in input order.
///
/// # Examples
///
/// ```
/// use quinta_domain::{Domain, SearchPerformance};
/// use quinta_engine::{EngineConfig, ReportRunner};
/// use quinta_sources::{HostVisits, MockSite, MockSource};
///
/// # #[tokio::main]
/// # async fn main() {
/// let domain = Domain::parse("example.com").unwrap();
/// let source = MockSource::new()
///     .with_site(
///         &domain,
///         MockSite::default()
///             .words(500)
///             .search(SearchPerformance::new(10, 100, 3.0).unwrap()),
///     )
///     .with_property("properties/1", vec![HostVisits::new("example.com", 50)]);
///
/// let runner = ReportRunner::new(source, EngineConfig::default());
/// let report = runner.run(&[domain]).await.unwrap();
/// let row = report.rows().next().unwrap();
/// assert_eq!(row.score, 50.25);
/// # }
/// ```
pub struct ReportRunner<S: MetricSource> {
    source: S,
    config: EngineConfig,
}

impl<S: MetricSource> ReportRunner<S> {
    /// Create a runner over a source
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self { source, config }
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The run configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn aborts(&self, err: &EngineError) -> bool {
        self.config.fail_fast || err.is_fatal()
    }

    /// Fetch, score and collect every domain
    ///
    /// # Errors
    ///
    /// Authentication failures always abort the run. With `fail_fast` set,
    /// the first adapter failure in input order aborts the run as well;
    /// otherwise failures are reported per domain.
    pub async fn run(&self, domains: &[Domain]) -> Result<RunReport, EngineError> {
        let started = Instant::now();
        let cache: MetricsCache<S::Session> = MetricsCache::new();
        let aggregator = Aggregator::new(&self.source, &cache);
        let mut summary = RunSummary::new(domains.len());
        let mut run_failures = Vec::new();

        tracing::info!(
            domains = domains.len(),
            concurrency = self.config.effective_concurrency(),
            fail_fast = self.config.fail_fast,
            "report run started"
        );

        aggregator.session().await?;

        if let Err(err) = aggregator.visits().await {
            if self.aborts(&err) {
                tracing::error!(error = %err, "analytics fetch failed");
                return Err(err);
            }
            tracing::warn!(error = %err, "analytics unavailable, continuing without user counts");
            summary.record_degraded_visits(err.kind());
            run_failures.push(DomainFailure::from(&err));
            cache.degrade_visits();
        }

        let aggregator = &aggregator;
        let mut results = stream::iter(domains)
            .map(|domain| async move { (domain, aggregator.build_record(domain).await) })
            .buffered(self.config.effective_concurrency());

        let mut reports = Vec::with_capacity(domains.len());
        while let Some((domain, result)) = results.next().await {
            let outcome = match result {
                Ok(record) => {
                    let row = ScoredRow::from_record(record);
                    tracing::debug!(%domain, score = row.score, "domain scored");
                    summary.record_success();
                    Ok(row)
                }
                Err(err) if self.aborts(&err) => {
                    tracing::error!(%domain, error = %err, "aborting run");
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(%domain, error = %err, "domain failed");
                    summary.record_failure(err.kind());
                    Err(DomainFailure::from(&err))
                }
            };
            reports.push(DomainReport {
                domain: domain.clone(),
                outcome,
            });
        }

        summary.runtime = started.elapsed();
        tracing::info!(
            reported = summary.succeeded,
            failed = summary.domains_failed(),
            elapsed_ms = summary.runtime.as_millis() as u64,
            "report run finished"
        );

        Ok(RunReport {
            domains: reports,
            run_failures,
            summary,
            cache: cache.stats(),
        })
    }
}
