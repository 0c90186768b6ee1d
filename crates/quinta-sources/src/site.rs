//! Direct probes against the monitored sites
//!
//! Three unauthenticated checks: root-path availability, the published word
//! count, and the Google tag embedded in the homepage.

use crate::error::SourceError;
use quinta_domain::{Domain, TagId};
use regex::Regex;
use std::sync::OnceLock;

/// Path every monitored site publishes its word count at
pub const WORDS_PATH: &str = "/words.txt";

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn tag_pattern() -> &'static Regex {
    TAG_PATTERN.get_or_init(|| {
        Regex::new(r#"googletagmanager\.com/gtag/js\?id=(G-[^"]+)"#)
            .expect("tag pattern is a valid regex")
    })
}

/// Extract the first Google tag id from homepage markup
///
/// # Examples
///
/// ```
/// use quinta_sources::site::extract_tag_id;
///
/// let html = r#"<script async src="https://www.googletagmanager.com/gtag/js?id=G-AB12CD"></script>"#;
/// assert_eq!(extract_tag_id(html).unwrap().as_str(), "G-AB12CD");
/// assert!(extract_tag_id("<html></html>").is_none());
/// ```
pub fn extract_tag_id(markup: &str) -> Option<TagId> {
    tag_pattern()
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .and_then(|m| TagId::new(m.as_str()))
}

/// Parse the body of `/words.txt`
pub fn parse_word_count(body: &str) -> Result<u64, SourceError> {
    let trimmed = body.trim();
    trimmed.parse::<u64>().map_err(|_| {
        let preview: String = trimmed.chars().take(40).collect();
        SourceError::DataShape(format!("word count is not an integer: {:?}", preview))
    })
}

/// HTTPS probes for a single site
pub struct SiteProbe {
    client: reqwest::Client,
    uptime_client: reqwest::Client,
    scheme: String,
}

impl SiteProbe {
    /// Create a probe that reaches sites over HTTPS
    ///
    /// `uptime_client` must be built with `redirect::Policy::none()`: the
    /// root status is judged as served, so a redirecting site is down.
    pub fn new(client: reqwest::Client, uptime_client: reqwest::Client) -> Self {
        Self {
            client,
            uptime_client,
            scheme: "https".to_string(),
        }
    }

    /// Use a different URL scheme (plain `http` for local test servers)
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    fn url(&self, domain: &Domain, path: &str) -> String {
        format!("{}://{}{}", self.scheme, domain, path)
    }

    /// HEAD the root path; true on a success status
    pub async fn uptime(&self, domain: &Domain) -> Result<bool, SourceError> {
        let response = self.uptime_client.head(self.url(domain, "/")).send().await?;
        let status = response.status();
        tracing::debug!(%domain, %status, "uptime probe");
        Ok(status.is_success())
    }

    /// GET `/words.txt` and parse it as an integer
    pub async fn content_size(&self, domain: &Domain) -> Result<u64, SourceError> {
        let body = self
            .client
            .get(self.url(domain, WORDS_PATH))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_word_count(&body)
    }

    /// GET the homepage and look for a Google tag id
    ///
    /// The body is searched whatever the status; error pages often carry
    /// the site's regular template.
    pub async fn tag_id(&self, domain: &Domain) -> Result<Option<TagId>, SourceError> {
        let markup = self
            .client
            .get(self.url(domain, "/"))
            .send()
            .await?
            .text()
            .await?;
        let tag = extract_tag_id(&markup);
        if tag.is_none() {
            tracing::debug!(%domain, "no google tag found on homepage");
        }
        Ok(tag)
    }
}
