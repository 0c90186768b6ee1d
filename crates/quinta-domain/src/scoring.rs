//! Composite ranking score
//!
//! Weights encode priority: active users dominate, then search clicks, then
//! impressions, with content size as the tiebreaker.

use crate::record::MetricRecord;

/// Weight of one active user
pub const USERS_WEIGHT: u128 = 10_000;

/// Weight of one search click
pub const CLICKS_WEIGHT: u128 = 100;

/// Weight of one search impression
pub const IMPRESSIONS_WEIGHT: u128 = 10;

/// Weight of one published word
pub const WORDS_WEIGHT: u128 = 1;

/// Divisor normalizing the weighted sum to "active user" units
pub const SCALE: f64 = 10_000.0;

/// Score from raw inputs
///
/// `active_users` of `None` scores the same as zero users.
pub fn score_components(
    active_users: Option<u64>,
    clicks: u64,
    impressions: u64,
    word_count: u64,
) -> f64 {
    // Integer sum keeps the result exact until the final division
    let weighted = u128::from(active_users.unwrap_or(0)) * USERS_WEIGHT
        + u128::from(clicks) * CLICKS_WEIGHT
        + u128::from(impressions) * IMPRESSIONS_WEIGHT
        + u128::from(word_count) * WORDS_WEIGHT;

    weighted as f64 / SCALE
}

/// Score a metric record
///
/// # Examples
///
/// ```
/// use quinta_domain::scoring::score_components;
///
/// assert_eq!(score_components(Some(50), 10, 100, 500), 50.25);
/// ```
pub fn score(record: &MetricRecord) -> f64 {
    score_components(
        record.active_users().count(),
        record.clicks(),
        record.impressions(),
        record.word_count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        // (50*10000 + 10*100 + 100*10 + 500) / 10000
        assert_eq!(score_components(Some(50), 10, 100, 500), 50.25);
    }

    #[test]
    fn test_absent_users_equal_zero_users() {
        assert_eq!(
            score_components(None, 3, 40, 1200),
            score_components(Some(0), 3, 40, 1200)
        );
    }

    #[test]
    fn test_weight_priority() {
        // One user outweighs 99 clicks
        assert!(score_components(Some(1), 0, 0, 0) > score_components(None, 99, 0, 0));
        // One click outweighs 9 impressions
        assert!(score_components(None, 1, 0, 0) > score_components(None, 0, 9, 0));
    }

    #[test]
    fn test_all_zero() {
        assert_eq!(score_components(None, 0, 0, 0), 0.0);
    }
}
