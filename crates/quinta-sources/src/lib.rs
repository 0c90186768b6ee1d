//! Quinta Metric Sources
//!
//! Adapters that fetch raw metrics for a domain from external services.
//!
//! # Architecture
//!
//! Every source implements [`MetricSource`]. Each operation is one idempotent
//! external call; memoization and aggregation happen in `quinta-engine`, so
//! implementations here never cache.
//!
//! # Sources
//!
//! - `LiveSource`: site probes over HTTPS plus the Search Console and
//!   Google Analytics REST APIs, authenticated with an impersonated token
//! - `MockSource`: deterministic in-memory source for testing
//!
//! # Examples
//!
//! ```
//! use quinta_domain::Domain;
//! use quinta_sources::{MetricSource, MockSource, MockSite};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let domain = Domain::parse("example.com").unwrap();
//! let source = MockSource::new().with_site(&domain, MockSite::default().words(250));
//!
//! assert_eq!(source.content_size(&domain).await.unwrap(), 250);
//! assert_eq!(source.call_count("content_size"), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod analytics;
pub mod auth;
pub mod error;
pub mod live;
pub mod mock;
pub mod search_console;
pub mod site;

#[cfg(test)]
mod test_server;

use async_trait::async_trait;
use quinta_domain::{Domain, SearchPerformance, TagId};
use std::fmt;

pub use auth::{AccessToken, AuthConfig, GoogleSession, Impersonator};
pub use error::SourceError;
pub use live::{LiveSource, LiveSourceConfig};
pub use mock::{MockSession, MockSite, MockSource};
pub use search_console::DateRange;
pub use site::SiteProbe;

/// Analytics property resource name (e.g. `properties/123456`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyId(String);

impl PropertyId {
    /// Wrap a property resource name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The resource name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Active users reported for one hostname by one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVisits {
    /// Hostname dimension value
    pub host: String,
    /// Active users over the report window
    pub active_users: u64,
}

impl HostVisits {
    /// Create a host visit row
    pub fn new(host: impl Into<String>, active_users: u64) -> Self {
        Self {
            host: host.into(),
            active_users,
        }
    }
}

/// A provider of raw per-domain metrics
///
/// `Session` is the authenticated-service handle. It is acquired once per
/// run through [`MetricSource::authenticate`] and shared by every operation
/// that talks to an authenticated API.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Authenticated handle shared by the API-backed operations
    type Session: Send + Sync;

    /// Acquire the authenticated handle
    async fn authenticate(&self) -> Result<Self::Session, SourceError>;

    /// Whether `https://{domain}/` answers with a success status
    async fn uptime(&self, domain: &Domain) -> Result<bool, SourceError>;

    /// Word count published by the domain at `/words.txt`
    async fn content_size(&self, domain: &Domain) -> Result<u64, SourceError>;

    /// Aggregate search clicks, impressions and position for the domain
    async fn search_performance(
        &self,
        session: &Self::Session,
        domain: &Domain,
    ) -> Result<SearchPerformance, SourceError>;

    /// Google tag id embedded in the homepage, if any
    async fn tag_id(&self, domain: &Domain) -> Result<Option<TagId>, SourceError>;

    /// Every analytics property visible to the authenticated identity
    async fn list_properties(&self, session: &Self::Session)
        -> Result<Vec<PropertyId>, SourceError>;

    /// Active users per hostname for one property over the trailing 28 days
    async fn property_visits(
        &self,
        session: &Self::Session,
        property: &PropertyId,
    ) -> Result<Vec<HostVisits>, SourceError>;
}
