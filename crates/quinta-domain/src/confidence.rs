//! Confidence estimation for click-through rates
//!
//! Raw CTR is a poor ranking statistic when sample sizes differ by orders of
//! magnitude: a domain with 1 click from 1 impression would outrank one with
//! 800 clicks from 1000. The lower bound of the Wilson score interval
//! penalizes small samples and converges on the raw ratio as impressions grow.

/// z-score for a two-sided 95% confidence level
pub const Z_95: f64 = 1.96;

/// Confidence interval representing [lower, upper] bounds of a proportion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    /// Lower bound [0.0, 1.0]
    pub lower: f64,
    /// Upper bound [0.0, 1.0]
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Create a new confidence interval
    ///
    /// # Panics
    /// Panics if bounds are invalid (lower > upper or out of [0, 1])
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!((0.0..=1.0).contains(&lower), "Lower bound must be in [0, 1]");
        assert!((0.0..=1.0).contains(&upper), "Upper bound must be in [0, 1]");
        assert!(lower <= upper, "Lower bound must be <= upper bound");

        Self { lower, upper }
    }

    /// Check if the interval contains a value
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Result of a confidence computation
///
/// A sample with zero trials has no interval at all. Callers must match on
/// the variant rather than assume a pair is always present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// No observations (`impressions == 0`)
    Degenerate,
    /// Wilson score interval for `n > 0`
    Interval(ConfidenceInterval),
}

impl Confidence {
    /// Lower bound, or `0.0` for the degenerate case
    pub fn lower(&self) -> f64 {
        match self {
            Confidence::Degenerate => 0.0,
            Confidence::Interval(ci) => ci.lower,
        }
    }

    /// The interval, if one exists
    pub fn interval(&self) -> Option<ConfidenceInterval> {
        match self {
            Confidence::Degenerate => None,
            Confidence::Interval(ci) => Some(*ci),
        }
    }

    /// Whether this is the zero-sample sentinel
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Confidence::Degenerate)
    }
}

/// Compute the 95% Wilson score interval for `clicks` successes out of
/// `impressions` trials
///
/// Returns [`Confidence::Degenerate`] when `impressions == 0`.
///
/// `clicks` above `impressions` is treated as `clicks == impressions`; the
/// record constructors reject that input before it gets here.
///
/// # Examples
///
/// ```
/// use quinta_domain::confidence::confidence_interval;
///
/// let ci = confidence_interval(10, 100).interval().unwrap();
/// assert!((ci.lower - 0.0553).abs() < 0.001);
/// assert!((ci.upper - 0.1744).abs() < 0.001);
/// ```
pub fn confidence_interval(clicks: u64, impressions: u64) -> Confidence {
    if impressions == 0 {
        return Confidence::Degenerate;
    }

    let clicks = clicks.min(impressions);
    let n = impressions as f64;
    let z2 = Z_95 * Z_95;
    let phat = clicks as f64 / n;

    let denom = 1.0 + z2 / n;
    let center = phat + z2 / (2.0 * n);
    let spread = Z_95 * (phat * (1.0 - phat) / n + z2 / (4.0 * n * n)).sqrt();

    // At the edges the closed form is exact but the float arithmetic is not
    let lower = if clicks == 0 {
        0.0
    } else {
        ((center - spread) / denom).clamp(0.0, phat)
    };
    let upper = if clicks == impressions {
        1.0
    } else {
        ((center + spread) / denom).clamp(phat, 1.0)
    };

    Confidence::Interval(ConfidenceInterval::new(lower, upper))
}

/// Lower bound of the Wilson score interval, `0.0` when there are no
/// impressions
///
/// This is the ranking statistic for CTR.
pub fn wilson_lower_bound(clicks: u64, impressions: u64) -> f64 {
    confidence_interval(clicks, impressions).lower()
}
