//! Configuration for report runs
//!
//! Controls fetch concurrency and the failure propagation policy.

use serde::{Deserialize, Serialize};

/// Default number of domains fetched concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for the report engine
///
/// # Examples
///
/// ```
/// use quinta_engine::EngineConfig;
///
/// // Default: concurrent fetches, failures isolated per domain
/// let config = EngineConfig::default();
/// assert_eq!(config.concurrency, 4);
/// assert!(!config.fail_fast);
///
/// // Sequential: one domain at a time, first failure aborts the run
/// let config = EngineConfig::sequential();
/// assert_eq!(config.concurrency, 1);
/// assert!(config.fail_fast);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of domains fetched at the same time
    /// Default: 4
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Abort the whole run on the first source failure instead of
    /// reporting the failed domain and continuing
    /// Default: false
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fail_fast: false,
        }
    }
}

impl EngineConfig {
    /// One domain at a time, abort on the first failure
    ///
    /// Matches a plain blocking loop over the domain list.
    pub fn sequential() -> Self {
        Self {
            concurrency: 1,
            fail_fast: true,
        }
    }

    /// Concurrency actually used; zero is treated as one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_sequential_config() {
        let config = EngineConfig::sequential();
        assert_eq!(config.effective_concurrency(), 1);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_zero_concurrency_is_one() {
        let config = EngineConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_serde_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());

        let config: EngineConfig = serde_json::from_str(r#"{"fail_fast": true}"#).unwrap();
        assert!(config.fail_fast);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }
}
