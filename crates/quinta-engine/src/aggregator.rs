//! Assembly of per-domain metric records
//!
//! Every adapter call goes through the run's [`MetricsCache`], so building
//! the same domain twice (or from two workers at once) reaches each external
//! service only once.

use crate::cache::{MetricsCache, VisitsByHost};
use crate::error::{EngineError, SourceKind};
use quinta_domain::{Domain, MetricRecord};
use quinta_sources::{HostVisits, MetricSource, PropertyId};
use std::sync::Arc;

/// Builds [`MetricRecord`]s from a source through a shared cache
pub struct Aggregator<'a, S: MetricSource> {
    source: &'a S,
    cache: &'a MetricsCache<S::Session>,
}

impl<'a, S: MetricSource> Aggregator<'a, S> {
    /// Create an aggregator over a source and the run's cache
    pub fn new(source: &'a S, cache: &'a MetricsCache<S::Session>) -> Self {
        Self { source, cache }
    }

    /// The run's cache
    pub fn cache(&self) -> &MetricsCache<S::Session> {
        self.cache
    }

    /// The authenticated session, acquired on first use
    pub async fn session(&self) -> Result<Arc<S::Session>, EngineError> {
        self.cache
            .session
            .get_or_try_init(|| async {
                tracing::info!("authenticating");
                self.source
                    .authenticate()
                    .await
                    .map(Arc::new)
                    .map_err(EngineError::Authentication)
            })
            .await
            .cloned()
    }

    /// Every analytics property, enumerated once and materialized
    pub async fn properties(&self) -> Result<Arc<Vec<PropertyId>>, EngineError> {
        self.cache
            .properties
            .get_or_try_init(|| async {
                let session = self.session().await?;
                self.source
                    .list_properties(&session)
                    .await
                    .map(Arc::new)
                    .map_err(|source| EngineError::RunSource {
                        kind: SourceKind::Properties,
                        source,
                    })
            })
            .await
            .cloned()
    }

    /// Active users per hostname summed across all properties
    pub async fn visits(&self) -> Result<Arc<VisitsByHost>, EngineError> {
        self.cache
            .visits
            .get_or_try_init(|| async {
                let session = self.session().await?;
                let properties = self.properties().await?;

                let mut rows: Vec<HostVisits> = Vec::new();
                for property in properties.iter() {
                    let report = self
                        .source
                        .property_visits(&session, property)
                        .await
                        .map_err(|source| EngineError::RunSource {
                            kind: SourceKind::Visits,
                            source,
                        })?;
                    rows.extend(report);
                }

                let visits = VisitsByHost::from_rows(rows);
                tracing::info!(
                    properties = properties.len(),
                    hosts = visits.len(),
                    "visits aggregated"
                );
                Ok::<_, EngineError>(Arc::new(visits))
            })
            .await
            .cloned()
    }

    /// Fetch every metric for `domain` and assemble its record
    ///
    /// # Errors
    ///
    /// Returns the first adapter failure, tagged with the domain and the
    /// adapter that produced it.
    pub async fn build_record(&self, domain: &Domain) -> Result<MetricRecord, EngineError> {
        tracing::debug!(%domain, "building record");

        let up = self
            .cache
            .uptime
            .get_or_try_init(domain, || self.source.uptime(domain))
            .await
            .map_err(EngineError::source_failure(domain, SourceKind::Uptime))?;

        let word_count = self
            .cache
            .content_size
            .get_or_try_init(domain, || self.source.content_size(domain))
            .await
            .map_err(EngineError::source_failure(domain, SourceKind::ContentSize))?;

        let session = self.session().await?;
        let search = self
            .cache
            .search_performance
            .get_or_try_init(domain, || self.source.search_performance(&session, domain))
            .await
            .map_err(EngineError::source_failure(domain, SourceKind::SearchPerformance))?;

        let tag_id = self
            .cache
            .tag_id
            .get_or_try_init(domain, || self.source.tag_id(domain))
            .await
            .map_err(EngineError::source_failure(domain, SourceKind::TagId))?;

        let active_users = self.visits().await?.active_users(domain);

        Ok(MetricRecord::new(
            domain.clone(),
            up,
            word_count,
            search,
            tag_id,
            active_users,
        ))
    }
}
