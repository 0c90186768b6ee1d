//! Quinta Domain Layer
//!
//! Core model and pure computations for the domain health report. This crate
//! has no runtime dependencies; everything that touches the network lives in
//! `quinta-sources` and everything that orchestrates lives in `quinta-engine`.
//!
//! ## Key Concepts
//!
//! - **Domain**: the hostname every metric is keyed by
//! - **Confidence**: Wilson score interval used to rank CTR fairly across
//!   domains with very different impression counts
//! - **MetricRecord**: the complete set of metrics for one domain
//! - **Score**: a weighted linear combination used for ranking
//!
//! ## Example
//!
//! ```
//! use quinta_domain::{ActiveUsers, Domain, MetricRecord, ScoredRow, SearchPerformance};
//!
//! let record = MetricRecord::new(
//!     Domain::parse("example.com").unwrap(),
//!     true,
//!     500,
//!     SearchPerformance::new(10, 100, 7.0).unwrap(),
//!     None,
//!     ActiveUsers::Count(50),
//! );
//! assert_eq!(ScoredRow::from_record(record).score, 50.25);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod domain;
pub mod record;
pub mod scoring;

// Re-exports for convenience
pub use confidence::{confidence_interval, wilson_lower_bound, Confidence, ConfidenceInterval};
pub use domain::{Domain, TagId};
pub use record::{ActiveUsers, InvalidRecord, MetricRecord, ScoredRow, SearchPerformance};
pub use scoring::score;
