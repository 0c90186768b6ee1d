//! Metric records - the per-domain unit of the report

use crate::confidence::wilson_lower_bound;
use crate::domain::{Domain, TagId};
use crate::scoring::score;
use std::fmt;

/// A record invariant was violated by source data
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidRecord {
    /// More clicks than impressions
    ClicksExceedImpressions {
        /// Reported clicks
        clicks: u64,
        /// Reported impressions
        impressions: u64,
    },
    /// Negative or non-finite average position
    InvalidPosition(f64),
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidRecord::ClicksExceedImpressions { clicks, impressions } => write!(
                f,
                "clicks ({}) exceed impressions ({})",
                clicks, impressions
            ),
            InvalidRecord::InvalidPosition(p) => write!(f, "invalid average position: {}", p),
        }
    }
}

impl std::error::Error for InvalidRecord {}

/// Aggregate search performance for one domain over the queried date range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPerformance {
    clicks: u64,
    impressions: u64,
    position: f64,
}

impl SearchPerformance {
    /// Create search figures, enforcing `impressions >= clicks` and
    /// `position >= 0`
    pub fn new(clicks: u64, impressions: u64, position: f64) -> Result<Self, InvalidRecord> {
        if clicks > impressions {
            return Err(InvalidRecord::ClicksExceedImpressions { clicks, impressions });
        }
        if !position.is_finite() || position < 0.0 {
            return Err(InvalidRecord::InvalidPosition(position));
        }
        Ok(Self {
            clicks,
            impressions,
            position,
        })
    }

    /// No search data for the range
    pub fn empty() -> Self {
        Self {
            clicks: 0,
            impressions: 0,
            position: 0.0,
        }
    }

    /// Total clicks
    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    /// Total impressions
    pub fn impressions(&self) -> u64 {
        self.impressions
    }

    /// Average result position
    pub fn position(&self) -> f64 {
        self.position
    }
}

/// Active users over the trailing 28 days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveUsers {
    /// Users reported by an analytics property for this hostname
    Count(u64),
    /// No analytics property reports this hostname
    Unavailable,
}

impl ActiveUsers {
    /// The count, treating `Unavailable` as zero
    pub fn or_zero(&self) -> u64 {
        match self {
            ActiveUsers::Count(n) => *n,
            ActiveUsers::Unavailable => 0,
        }
    }

    /// The count, if reported
    pub fn count(&self) -> Option<u64> {
        match self {
            ActiveUsers::Count(n) => Some(*n),
            ActiveUsers::Unavailable => None,
        }
    }
}

impl From<Option<u64>> for ActiveUsers {
    fn from(value: Option<u64>) -> Self {
        value.map_or(ActiveUsers::Unavailable, ActiveUsers::Count)
    }
}

/// Complete set of metrics for one domain
///
/// `ctr_lower_bound_pct` is always derived from the search figures; there is
/// no way to set it independently.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    domain: Domain,
    up: bool,
    word_count: u64,
    search: SearchPerformance,
    ctr_lower_bound_pct: f64,
    tag_id: Option<TagId>,
    active_users: ActiveUsers,
}

impl MetricRecord {
    /// Assemble a record from adapter outputs
    ///
    /// # Examples
    ///
    /// ```
    /// use quinta_domain::{ActiveUsers, Domain, MetricRecord, SearchPerformance};
    ///
    /// let search = SearchPerformance::new(10, 100, 3.5).unwrap();
    /// let record = MetricRecord::new(
    ///     Domain::parse("example.com").unwrap(),
    ///     true,
    ///     500,
    ///     search,
    ///     None,
    ///     ActiveUsers::Count(50),
    /// );
    /// assert!((record.ctr_lower_bound_pct() - 5.53).abs() < 0.1);
    /// ```
    pub fn new(
        domain: Domain,
        up: bool,
        word_count: u64,
        search: SearchPerformance,
        tag_id: Option<TagId>,
        active_users: ActiveUsers,
    ) -> Self {
        let ctr_lower_bound_pct = wilson_lower_bound(search.clicks, search.impressions) * 100.0;
        Self {
            domain,
            up,
            word_count,
            search,
            ctr_lower_bound_pct,
            tag_id,
            active_users,
        }
    }

    /// Hostname this record describes
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Whether the root path answered with a success status
    pub fn up(&self) -> bool {
        self.up
    }

    /// Published word count
    pub fn word_count(&self) -> u64 {
        self.word_count
    }

    /// Search clicks
    pub fn clicks(&self) -> u64 {
        self.search.clicks
    }

    /// Search impressions
    pub fn impressions(&self) -> u64 {
        self.search.impressions
    }

    /// Average search position
    pub fn position(&self) -> f64 {
        self.search.position
    }

    /// Search figures
    pub fn search(&self) -> &SearchPerformance {
        &self.search
    }

    /// Wilson lower bound of CTR as a percentage in [0, 100]
    pub fn ctr_lower_bound_pct(&self) -> f64 {
        self.ctr_lower_bound_pct
    }

    /// Google tag id, if the homepage carries one
    pub fn tag_id(&self) -> Option<&TagId> {
        self.tag_id.as_ref()
    }

    /// Active users over the trailing 28 days
    pub fn active_users(&self) -> ActiveUsers {
        self.active_users
    }
}

/// A metric record with its ranking score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    /// The underlying metrics
    pub record: MetricRecord,
    /// Composite score
    pub score: f64,
}

impl ScoredRow {
    /// Score a completed record
    pub fn from_record(record: MetricRecord) -> Self {
        let score = score(&record);
        Self { record, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    #[test]
    fn test_search_performance_rejects_more_clicks_than_impressions() {
        let err = SearchPerformance::new(11, 10, 1.0).unwrap_err();
        assert_eq!(
            err,
            InvalidRecord::ClicksExceedImpressions {
                clicks: 11,
                impressions: 10
            }
        );
        assert!(err.to_string().contains("exceed"));
    }

    #[test]
    fn test_search_performance_rejects_negative_position() {
        assert!(SearchPerformance::new(1, 10, -1.0).is_err());
        assert!(SearchPerformance::new(1, 10, f64::NAN).is_err());
    }

    #[test]
    fn test_ctr_derived_from_search() {
        let record = MetricRecord::new(
            domain(),
            true,
            0,
            SearchPerformance::new(10, 100, 2.0).unwrap(),
            None,
            ActiveUsers::Unavailable,
        );
        let expected = wilson_lower_bound(10, 100) * 100.0;
        assert_eq!(record.ctr_lower_bound_pct(), expected);
    }

    #[test]
    fn test_empty_search_gives_zero_ctr() {
        let record = MetricRecord::new(
            domain(),
            false,
            0,
            SearchPerformance::empty(),
            None,
            ActiveUsers::Unavailable,
        );
        assert_eq!(record.ctr_lower_bound_pct(), 0.0);
    }

    #[test]
    fn test_active_users_conversions() {
        assert_eq!(ActiveUsers::from(Some(3)), ActiveUsers::Count(3));
        assert_eq!(ActiveUsers::from(None), ActiveUsers::Unavailable);
        assert_eq!(ActiveUsers::Unavailable.or_zero(), 0);
        assert_eq!(ActiveUsers::Count(7).count(), Some(7));
    }

    #[test]
    fn test_scored_row() {
        let record = MetricRecord::new(
            domain(),
            true,
            500,
            SearchPerformance::new(10, 100, 4.2).unwrap(),
            TagId::new("G-TEST"),
            ActiveUsers::Count(50),
        );
        let row = ScoredRow::from_record(record);
        assert_eq!(row.score, 50.25);
        assert_eq!(row.record.tag_id().unwrap().as_str(), "G-TEST");
    }
}
