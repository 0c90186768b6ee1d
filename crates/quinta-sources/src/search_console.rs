//! Search Console search analytics client

use crate::auth::GoogleSession;
use crate::error::SourceError;
use quinta_domain::{Domain, SearchPerformance};
use serde::{Deserialize, Serialize};

/// Default Search Console (webmasters v3) endpoint
pub const SEARCH_CONSOLE_ENDPOINT: &str = "https://www.googleapis.com/webmasters/v3";

/// Inclusive date range for search analytics queries (`YYYY-MM-DD`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    /// First day of the range
    pub start_date: String,
    /// Last day of the range
    pub end_date: String,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start_date: "2023-08-25".to_string(),
            end_date: "2023-09-22".to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    start_date: &'a str,
    end_date: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    clicks: f64,
    impressions: f64,
    position: f64,
}

/// Search Console property identifier for a domain property
pub fn site_url(domain: &Domain) -> String {
    format!("sc-domain:{}", domain)
}

/// Percent-encode a site URL for use as a single path segment
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn to_count(value: f64, field: &str) -> Result<u64, SourceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value.round() as u64)
    } else {
        Err(SourceError::DataShape(format!("{} is not a count: {}", field, value)))
    }
}

/// Convert a query response body into search figures
///
/// An empty response (no traffic in the range) yields zero figures.
fn parse_query_response(domain: &Domain, body: &str) -> Result<SearchPerformance, SourceError> {
    let response: QueryResponse = serde_json::from_str(body)?;

    let Some(row) = response.rows.first() else {
        tracing::warn!(%domain, "search analytics returned no rows, using zero figures");
        return Ok(SearchPerformance::empty());
    };

    let clicks = to_count(row.clicks, "clicks")?;
    let impressions = to_count(row.impressions, "impressions")?;
    Ok(SearchPerformance::new(clicks, impressions, row.position)?)
}

/// Client for `searchAnalytics.query`
pub struct SearchConsole {
    client: reqwest::Client,
    endpoint: String,
    range: DateRange,
}

impl SearchConsole {
    /// Create a client querying the given date range
    pub fn new(client: reqwest::Client, range: DateRange) -> Self {
        Self {
            client,
            endpoint: SEARCH_CONSOLE_ENDPOINT.to_string(),
            range,
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Date range every query covers
    pub fn range(&self) -> &DateRange {
        &self.range
    }

    fn query_url(&self, domain: &Domain) -> String {
        format!(
            "{}/sites/{}/searchAnalytics/query",
            self.endpoint.trim_end_matches('/'),
            encode_path_segment(&site_url(domain))
        )
    }

    /// Aggregate clicks, impressions and position for the domain property
    pub async fn query(
        &self,
        session: &GoogleSession,
        domain: &Domain,
    ) -> Result<SearchPerformance, SourceError> {
        let request = QueryRequest {
            start_date: &self.range.start_date,
            end_date: &self.range.end_date,
        };

        let body = session
            .authorize(self.client.post(self.query_url(domain)))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_query_response(domain, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessToken;
    use crate::test_server::{Reply, TestServer};

    fn session() -> GoogleSession {
        GoogleSession::new(AccessToken::new("ya29.local", None))
    }

    fn local(server: &TestServer) -> SearchConsole {
        SearchConsole::new(reqwest::Client::new(), DateRange::default()).with_endpoint(server.url())
    }

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    #[test]
    fn test_query_url_encodes_site() {
        let sc = SearchConsole::new(reqwest::Client::new(), DateRange::default());
        assert_eq!(
            sc.query_url(&domain()),
            "https://www.googleapis.com/webmasters/v3/sites/sc-domain%3Aexample.com/searchAnalytics/query"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let range = DateRange::default();
        let json = serde_json::to_value(QueryRequest {
            start_date: &range.start_date,
            end_date: &range.end_date,
        })
        .unwrap();
        assert_eq!(json["startDate"], "2023-08-25");
        assert_eq!(json["endDate"], "2023-09-22");
    }

    #[test]
    fn test_parse_single_row() {
        let body = r#"{
            "rows": [{"clicks": 10, "impressions": 100, "ctr": 0.1, "position": 7.25}],
            "responseAggregationType": "byProperty"
        }"#;
        let perf = parse_query_response(&domain(), body).unwrap();
        assert_eq!(perf.clicks(), 10);
        assert_eq!(perf.impressions(), 100);
        assert_eq!(perf.position(), 7.25);
    }

    #[test]
    fn test_parse_no_rows_is_zero() {
        let perf = parse_query_response(&domain(), r#"{"responseAggregationType": "auto"}"#).unwrap();
        assert_eq!(perf, SearchPerformance::empty());
    }

    #[test]
    fn test_parse_rejects_inconsistent_row() {
        let body = r#"{"rows": [{"clicks": 5, "impressions": 2, "position": 1.0}]}"#;
        let err = parse_query_response(&domain(), body).unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        let err = parse_query_response(&domain(), r#"{"rows": [{"clicks": "x"}]}"#).unwrap_err();
        assert!(matches!(err, SourceError::DataShape(_)));
    }

    #[tokio::test]
    async fn test_query_posts_range_with_bearer_token() {
        let server = TestServer::start(|_| {
            Reply::json(200, r#"{"rows": [{"clicks": 3, "impressions": 40, "ctr": 0.075, "position": 4.5}]}"#)
        })
        .await;

        let perf = local(&server).query(&session(), &domain()).await.unwrap();
        assert_eq!(perf, SearchPerformance::new(3, 40, 4.5).unwrap());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].target,
            "/sites/sc-domain%3Aexample.com/searchAnalytics/query"
        );
        assert_eq!(requests[0].header("authorization"), Some("Bearer ya29.local"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["startDate"], "2023-08-25");
        assert_eq!(body["endDate"], "2023-09-22");
    }

    #[tokio::test]
    async fn test_query_without_rows_is_zero() {
        let server = TestServer::start(|_| Reply::json(200, r#"{"responseAggregationType": "byProperty"}"#)).await;

        let perf = local(&server).query(&session(), &domain()).await.unwrap();
        assert_eq!(perf, SearchPerformance::empty());
    }

    #[tokio::test]
    async fn test_query_forbidden_is_http_error() {
        let server = TestServer::start(|_| Reply::json(403, r#"{"error": {"code": 403}}"#)).await;

        let err = local(&server).query(&session(), &domain()).await.unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 403, .. }));
        assert!(err.to_string().starts_with("HTTP 403 from"));
    }
}
