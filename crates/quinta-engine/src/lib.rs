//! Quinta Engine
//!
//! Orchestrates a report run: fetches every metric for every domain through a
//! run-scoped cache, scores the records and collects the outcome.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Memoization**: each adapter call is made at most once per key per run,
//!   including when several domains are fetched concurrently
//! - **Aggregation**: assembling a `MetricRecord` from the adapter results
//! - **Scheduling**: a bounded pipeline over the domain list that keeps
//!   input order
//! - **Failure policy**: abort on the first failure, or isolate failures to
//!   the domain that produced them
//!
//! # Failure Policy
//!
//! | Failure | `fail_fast = true` | `fail_fast = false` (default) |
//! |---------|--------------------|-------------------------------|
//! | Authentication | run aborts | run aborts |
//! | Property enumeration or visits | run aborts | users shown as unavailable |
//! | Per-domain adapter | run aborts | domain reported as failed |
//!
//! # Usage
//!
//! ```
//! use quinta_domain::Domain;
//! use quinta_engine::{EngineConfig, ReportRunner};
//! use quinta_sources::{MockSite, MockSource};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let up = Domain::parse("up.example").unwrap();
//! let broken = Domain::parse("broken.example").unwrap();
//! let source = MockSource::new()
//!     .with_site(&up, MockSite::default().words(1200))
//!     .with_site(&broken, MockSite::default())
//!     .with_failure("content_size", Some("broken.example"));
//!
//! let runner = ReportRunner::new(source, EngineConfig::default());
//! let report = runner.run(&[up, broken]).await?;
//!
//! assert_eq!(report.rows().count(), 1);
//! assert_eq!(report.failures().count(), 1);
//! println!("{}", report.summary.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [engine]
//! concurrency = 4
//! fail_fast = false
//! ```

#![warn(missing_docs)]

mod aggregator;
pub mod cache;
mod config;
mod error;
mod runner;
mod summary;

pub use aggregator::Aggregator;
pub use cache::{CacheStats, MetricsCache, VisitsByHost};
pub use config::{EngineConfig, DEFAULT_CONCURRENCY};
pub use error::{EngineError, SourceKind};
pub use runner::{DomainFailure, DomainReport, ReportRunner, RunReport};
pub use summary::RunSummary;
