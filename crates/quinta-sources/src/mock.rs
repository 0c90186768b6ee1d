//! Deterministic in-memory metric source
//!
//! Returns pre-configured figures without making any network calls, counts
//! every call per operation and per key, and can be told to fail specific
//! calls. Used by the engine and CLI tests.

use crate::error::SourceError;
use crate::{HostVisits, MetricSource, PropertyId};
use async_trait::async_trait;
use quinta_domain::{Domain, SearchPerformance, TagId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Canned metrics for one mocked site
#[derive(Debug, Clone)]
pub struct MockSite {
    up: bool,
    words: u64,
    search: SearchPerformance,
    tag: Option<TagId>,
}

impl Default for MockSite {
    fn default() -> Self {
        Self {
            up: true,
            words: 0,
            search: SearchPerformance::empty(),
            tag: None,
        }
    }
}

impl MockSite {
    /// Set uptime
    pub fn up(mut self, up: bool) -> Self {
        self.up = up;
        self
    }

    /// Set the word count
    pub fn words(mut self, words: u64) -> Self {
        self.words = words;
        self
    }

    /// Set the search figures
    pub fn search(mut self, search: SearchPerformance) -> Self {
        self.search = search;
        self
    }

    /// Set the homepage tag id
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = TagId::new(tag);
        self
    }
}

/// Session handed out by [`MockSource::authenticate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSession {
    /// Sequence number of the authentication that produced this session
    pub id: usize,
}

/// Mock metric source for deterministic testing
///
/// # Examples
///
/// ```
/// use quinta_domain::{Domain, SearchPerformance};
/// use quinta_sources::{HostVisits, MetricSource, MockSite, MockSource, PropertyId};
///
/// # #[tokio::main]
/// # async fn main() {
/// let domain = Domain::parse("example.com").unwrap();
/// let source = MockSource::new()
///     .with_site(&domain, MockSite::default().search(SearchPerformance::new(1, 10, 2.0).unwrap()))
///     .with_property("properties/1", vec![HostVisits::new("example.com", 5)])
///     .with_failure("tag_id", Some("example.com"));
///
/// let session = source.authenticate().await.unwrap();
/// assert_eq!(source.search_performance(&session, &domain).await.unwrap().clicks(), 1);
/// assert!(source.tag_id(&domain).await.is_err());
/// assert_eq!(source.list_properties(&session).await.unwrap(), vec![PropertyId::new("properties/1")]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    sites: HashMap<Domain, MockSite>,
    properties: Vec<(PropertyId, Vec<HostVisits>)>,
    failures: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

fn call_key(operation: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{}:{}", operation, key),
        None => operation.to_string(),
    }
}

impl MockSource {
    /// Create an empty mock source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add canned metrics for a domain
    pub fn with_site(mut self, domain: &Domain, site: MockSite) -> Self {
        self.sites.insert(domain.clone(), site);
        self
    }

    /// Add an analytics property and its hostname report
    pub fn with_property(mut self, property: &str, visits: Vec<HostVisits>) -> Self {
        self.properties.push((PropertyId::new(property), visits));
        self
    }

    /// Fail an operation, either for every key or for one key
    ///
    /// Operation names match the [`MetricSource`] method names; keys are the
    /// domain or property name.
    pub fn with_failure(mut self, operation: &str, key: Option<&str>) -> Self {
        self.failures.insert(call_key(operation, key));
        self
    }

    /// Sleep before answering each call, to widen race windows in tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls made to an operation, across all keys
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{}:", operation);
        self.counts()
            .iter()
            .filter(|(k, _)| k.as_str() == operation || k.starts_with(&prefix))
            .map(|(_, n)| *n)
            .sum()
    }

    /// Number of calls made to an operation for one key
    pub fn call_count_for(&self, operation: &str, key: &str) -> usize {
        self.counts()
            .get(&call_key(operation, Some(key)))
            .copied()
            .unwrap_or(0)
    }

    /// Reset all call counters
    pub fn reset_call_counts(&self) {
        self.counts().clear();
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, operation: &str, key: Option<&str>) -> Result<usize, SourceError> {
        let count = {
            let mut calls = self.counts();
            let entry = calls.entry(call_key(operation, key)).or_insert(0);
            *entry += 1;
            *entry
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.contains(operation) || self.failures.contains(&call_key(operation, key)) {
            return Err(SourceError::Unavailable(format!(
                "mock failure: {}",
                call_key(operation, key)
            )));
        }
        Ok(count)
    }

    fn site(&self, domain: &Domain) -> Result<&MockSite, SourceError> {
        self.sites
            .get(domain)
            .ok_or_else(|| SourceError::Unavailable(format!("no mock site for {}", domain)))
    }
}

#[async_trait]
impl MetricSource for MockSource {
    type Session = MockSession;

    async fn authenticate(&self) -> Result<MockSession, SourceError> {
        let id = self
            .enter("authenticate", None)
            .await
            .map_err(|e| SourceError::Authentication(e.to_string()))?;
        Ok(MockSession { id })
    }

    async fn uptime(&self, domain: &Domain) -> Result<bool, SourceError> {
        self.enter("uptime", Some(domain.as_str())).await?;
        Ok(self.site(domain)?.up)
    }

    async fn content_size(&self, domain: &Domain) -> Result<u64, SourceError> {
        self.enter("content_size", Some(domain.as_str())).await?;
        Ok(self.site(domain)?.words)
    }

    async fn search_performance(
        &self,
        _session: &MockSession,
        domain: &Domain,
    ) -> Result<SearchPerformance, SourceError> {
        self.enter("search_performance", Some(domain.as_str())).await?;
        Ok(self.site(domain)?.search)
    }

    async fn tag_id(&self, domain: &Domain) -> Result<Option<TagId>, SourceError> {
        self.enter("tag_id", Some(domain.as_str())).await?;
        Ok(self.site(domain)?.tag.clone())
    }

    async fn list_properties(&self, _session: &MockSession) -> Result<Vec<PropertyId>, SourceError> {
        self.enter("list_properties", None).await?;
        Ok(self.properties.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn property_visits(
        &self,
        _session: &MockSession,
        property: &PropertyId,
    ) -> Result<Vec<HostVisits>, SourceError> {
        self.enter("property_visits", Some(property.as_str())).await?;
        self.properties
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, visits)| visits.clone())
            .ok_or_else(|| SourceError::DataShape(format!("unknown property {}", property)))
    }
}
