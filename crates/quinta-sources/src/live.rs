//! Production metric source
//!
//! Combines the site probes with the Google APIs behind one shared HTTP
//! client.

use crate::analytics::Analytics;
use crate::auth::{AuthConfig, GoogleSession, Impersonator};
use crate::error::SourceError;
use crate::search_console::{DateRange, SearchConsole};
use crate::site::SiteProbe;
use crate::{HostVisits, MetricSource, PropertyId};
use async_trait::async_trait;
use quinta_domain::{Domain, SearchPerformance, TagId};
use std::time::Duration;

/// Default timeout for every outbound request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for [`LiveSource`]
#[derive(Debug, Clone)]
pub struct LiveSourceConfig {
    /// Impersonation settings
    pub auth: AuthConfig,
    /// Search analytics date range
    pub search_range: DateRange,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for LiveSourceConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            search_range: DateRange::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

fn user_agent(configured: Option<&str>) -> String {
    match configured {
        Some(ua) => ua.to_string(),
        None => format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    }
}

/// Metric source backed by live HTTP and Google API calls
pub struct LiveSource {
    site: SiteProbe,
    impersonator: Impersonator,
    search_console: SearchConsole,
    analytics: Analytics,
}

impl LiveSource {
    /// Build the shared HTTP client and every API client on top of it
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quinta_sources::{LiveSource, LiveSourceConfig};
    ///
    /// let source = LiveSource::new(LiveSourceConfig::default()).unwrap();
    /// ```
    pub fn new(config: LiveSourceConfig) -> Result<Self, SourceError> {
        let client = http_client(&config, reqwest::redirect::Policy::default())?;
        let uptime_client = http_client(&config, reqwest::redirect::Policy::none())?;

        Ok(Self {
            site: SiteProbe::new(client.clone(), uptime_client),
            impersonator: Impersonator::new(client.clone(), config.auth),
            search_console: SearchConsole::new(client.clone(), config.search_range),
            analytics: Analytics::new(client),
        })
    }

    /// Date range used for search analytics
    pub fn search_range(&self) -> &DateRange {
        self.search_console.range()
    }
}

fn http_client(
    config: &LiveSourceConfig,
    redirect: reqwest::redirect::Policy,
) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(user_agent(config.user_agent.as_deref()))
        .redirect(redirect)
        .build()
        .map_err(|e| SourceError::Config(e.to_string()))
}

#[async_trait]
impl MetricSource for LiveSource {
    type Session = GoogleSession;

    async fn authenticate(&self) -> Result<GoogleSession, SourceError> {
        self.impersonator.impersonate().await
    }

    async fn uptime(&self, domain: &Domain) -> Result<bool, SourceError> {
        self.site.uptime(domain).await
    }

    async fn content_size(&self, domain: &Domain) -> Result<u64, SourceError> {
        self.site.content_size(domain).await
    }

    async fn search_performance(
        &self,
        session: &GoogleSession,
        domain: &Domain,
    ) -> Result<SearchPerformance, SourceError> {
        self.search_console.query(session, domain).await
    }

    async fn tag_id(&self, domain: &Domain) -> Result<Option<TagId>, SourceError> {
        self.site.tag_id(domain).await
    }

    async fn list_properties(&self, session: &GoogleSession) -> Result<Vec<PropertyId>, SourceError> {
        self.analytics.list_properties(session).await
    }

    async fn property_visits(
        &self,
        session: &GoogleSession,
        property: &PropertyId,
    ) -> Result<Vec<HostVisits>, SourceError> {
        self.analytics.property_visits(session, property).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, TestServer};

    #[test]
    fn test_default_config() {
        let config = LiveSourceConfig::default();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.search_range, DateRange::default());
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_user_agent() {
        assert_eq!(user_agent(Some("monitor/1")), "monitor/1");
        assert!(user_agent(None).starts_with("quinta-sources/"));
    }

    #[test]
    fn test_live_source_creation() {
        let source = LiveSource::new(LiveSourceConfig::default()).unwrap();
        assert_eq!(source.search_range().start_date, "2023-08-25");
    }

    #[tokio::test]
    async fn test_uptime_client_reports_redirect_status() {
        let server = TestServer::start(|request| match request.target.as_str() {
            "/" => Reply::new(302).header("Location", "/elsewhere"),
            _ => Reply::new(200),
        })
        .await;
        let config = LiveSourceConfig::default();

        let uptime = http_client(&config, reqwest::redirect::Policy::none()).unwrap();
        let response = uptime.head(format!("{}/", server.url())).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 302);

        let followed = http_client(&config, reqwest::redirect::Policy::default()).unwrap();
        let response = followed.head(format!("{}/", server.url())).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(server.requests().len(), 3);
    }
}
