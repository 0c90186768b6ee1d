//! Error types for report runs

use quinta_domain::Domain;
use quinta_sources::SourceError;
use std::fmt;
use thiserror::Error;

/// The adapter call that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Impersonated credential acquisition
    Authentication,
    /// Root-path availability probe
    Uptime,
    /// `/words.txt` fetch
    ContentSize,
    /// Search analytics query
    SearchPerformance,
    /// Homepage tag detection
    TagId,
    /// Analytics property enumeration
    Properties,
    /// Analytics hostname reports
    Visits,
}

impl SourceKind {
    /// Short name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Authentication => "authentication",
            SourceKind::Uptime => "uptime",
            SourceKind::ContentSize => "content size",
            SourceKind::SearchPerformance => "search performance",
            SourceKind::TagId => "tag id",
            SourceKind::Properties => "property enumeration",
            SourceKind::Visits => "visits",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a report run
#[derive(Error, Debug)]
pub enum EngineError {
    /// Credentials could not be acquired; always fatal
    #[error("Authentication failed: {0}")]
    Authentication(#[source] SourceError),

    /// A per-domain adapter call failed
    #[error("{kind} failed for {domain}: {source}")]
    Source {
        /// Domain being fetched
        domain: String,
        /// Failing adapter
        kind: SourceKind,
        /// Underlying error
        #[source]
        source: SourceError,
    },

    /// A whole-run adapter call failed
    #[error("{kind} failed: {source}")]
    RunSource {
        /// Failing adapter
        kind: SourceKind,
        /// Underlying error
        #[source]
        source: SourceError,
    },
}

impl EngineError {
    /// Whether this error must abort the run regardless of policy
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Authentication(_))
    }

    /// The adapter that failed
    pub fn kind(&self) -> SourceKind {
        match self {
            EngineError::Authentication(_) => SourceKind::Authentication,
            EngineError::Source { kind, .. } | EngineError::RunSource { kind, .. } => *kind,
        }
    }

    /// Map a source error for `domain` into an engine error
    pub(crate) fn source_failure(domain: &Domain, kind: SourceKind) -> impl FnOnce(SourceError) -> Self {
        let domain = domain.to_string();
        move |source| EngineError::Source {
            domain,
            kind,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Source {
            domain: "example.com".into(),
            kind: SourceKind::ContentSize,
            source: SourceError::Unavailable("connection refused".into()),
        };
        assert_eq!(
            err.to_string(),
            "content size failed for example.com: Source unavailable: connection refused"
        );
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), SourceKind::ContentSize);
    }

    #[test]
    fn test_authentication_is_fatal() {
        let err = EngineError::Authentication(SourceError::Authentication("denied".into()));
        assert!(err.is_fatal());
        assert_eq!(err.kind(), SourceKind::Authentication);
    }
}
