//! Google Analytics clients
//!
//! Property enumeration goes through the Admin API; per-property hostname
//! reports go through the Data API.

use crate::auth::GoogleSession;
use crate::error::SourceError;
use crate::{HostVisits, PropertyId};
use serde::{Deserialize, Serialize};

/// Default Analytics Admin API endpoint
pub const ADMIN_ENDPOINT: &str = "https://analyticsadmin.googleapis.com/v1beta";

/// Default Analytics Data API endpoint
pub const DATA_ENDPOINT: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Page size requested from `accountSummaries.list`
pub const ACCOUNT_SUMMARIES_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSummariesPage {
    #[serde(default)]
    account_summaries: Vec<AccountSummary>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSummary {
    #[serde(default)]
    property_summaries: Vec<PropertySummary>,
}

#[derive(Debug, Deserialize)]
struct PropertySummary {
    property: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportRequest {
    dimensions: Vec<Named>,
    metrics: Vec<Named>,
    date_ranges: Vec<ReportDateRange>,
}

#[derive(Serialize)]
struct Named {
    name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDateRange {
    start_date: &'static str,
    end_date: &'static str,
}

impl RunReportRequest {
    /// Active users by hostname over the trailing 28 days
    fn active_users_by_host() -> Self {
        Self {
            dimensions: vec![Named { name: "hostName" }],
            metrics: vec![Named { name: "activeUsers" }],
            date_ranges: vec![ReportDateRange {
                start_date: "28daysAgo",
                end_date: "today",
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReportResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    dimension_values: Vec<ReportValue>,
    #[serde(default)]
    metric_values: Vec<ReportValue>,
}

#[derive(Debug, Deserialize)]
struct ReportValue {
    value: String,
}

/// Flatten one page of account summaries into property names
fn parse_account_summaries(body: &str) -> Result<(Vec<PropertyId>, Option<String>), SourceError> {
    let page: AccountSummariesPage = serde_json::from_str(body)?;
    let properties = page
        .account_summaries
        .into_iter()
        .flat_map(|account| account.property_summaries)
        .map(|summary| PropertyId::new(summary.property))
        .collect();
    let next = page.next_page_token.filter(|t| !t.is_empty());
    Ok((properties, next))
}

/// Convert a `runReport` body into hostname rows
fn parse_report(body: &str) -> Result<Vec<HostVisits>, SourceError> {
    let report: RunReportResponse = serde_json::from_str(body)?;
    report
        .rows
        .into_iter()
        .map(|row| {
            let host = row
                .dimension_values
                .first()
                .map(|v| v.value.clone())
                .ok_or_else(|| SourceError::DataShape("report row without hostName".into()))?;
            let users = row
                .metric_values
                .first()
                .ok_or_else(|| SourceError::DataShape("report row without activeUsers".into()))?
                .value
                .parse::<u64>()
                .map_err(|e| SourceError::DataShape(format!("activeUsers for {}: {}", host, e)))?;
            Ok(HostVisits::new(host, users))
        })
        .collect()
}

/// Client for the Analytics Admin and Data APIs
pub struct Analytics {
    client: reqwest::Client,
    admin_endpoint: String,
    data_endpoint: String,
}

impl Analytics {
    /// Create a client using the public endpoints
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            admin_endpoint: ADMIN_ENDPOINT.to_string(),
            data_endpoint: DATA_ENDPOINT.to_string(),
        }
    }

    /// Override both API endpoints
    pub fn with_endpoints(mut self, admin: impl Into<String>, data: impl Into<String>) -> Self {
        self.admin_endpoint = admin.into();
        self.data_endpoint = data.into();
        self
    }

    fn report_url(&self, property: &PropertyId) -> String {
        format!(
            "{}/{}:runReport",
            self.data_endpoint.trim_end_matches('/'),
            property
        )
    }

    /// Enumerate every property across every account, following pagination
    ///
    /// The result is fully materialized so it can be cached and re-read.
    pub async fn list_properties(
        &self,
        session: &GoogleSession,
    ) -> Result<Vec<PropertyId>, SourceError> {
        let url = format!(
            "{}/accountSummaries",
            self.admin_endpoint.trim_end_matches('/')
        );
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = session
                .authorize(self.client.get(&url))
                .query(&[("pageSize", ACCOUNT_SUMMARIES_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let body = request.send().await?.error_for_status()?.text().await?;
            let (page, next) = parse_account_summaries(&body)?;
            properties.extend(page);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::info!(count = properties.len(), "enumerated analytics properties");
        Ok(properties)
    }

    /// Active users per hostname for one property
    pub async fn property_visits(
        &self,
        session: &GoogleSession,
        property: &PropertyId,
    ) -> Result<Vec<HostVisits>, SourceError> {
        let body = session
            .authorize(self.client.post(self.report_url(property)))
            .json(&RunReportRequest::active_users_by_host())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let rows = parse_report(&body)?;
        tracing::debug!(%property, hosts = rows.len(), "analytics report");
        Ok(rows)
    }
}
