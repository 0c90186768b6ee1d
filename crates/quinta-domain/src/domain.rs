//! Domain and tag identifiers

use std::fmt;

/// A monitored hostname, e.g. `example.com`
///
/// Identity key for every per-domain metric and cache entry. The value is
/// opaque: no DNS or URL validation is performed beyond trimming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Domain(String);

impl Domain {
    /// Create a domain from a hostname
    ///
    /// Returns `None` for an empty or whitespace-only name.
    ///
    /// # Examples
    ///
    /// ```
    /// use quinta_domain::Domain;
    ///
    /// let d = Domain::parse(" example.com ").unwrap();
    /// assert_eq!(d.as_str(), "example.com");
    /// assert!(Domain::parse("  ").is_none());
    /// ```
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The hostname
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Google tag identifier found on a homepage (`G-XXXXXXX`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagId(String);

impl TagId {
    /// Wrap a tag id; only `G-` prefixed ids are accepted
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.starts_with("G-") && id.len() > 2 {
            Some(Self(id))
        } else {
            None
        }
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse() {
        assert_eq!(Domain::parse("codesnips.pro").unwrap().to_string(), "codesnips.pro");
        assert!(Domain::parse("").is_none());
    }

    #[test]
    fn test_tag_id_prefix() {
        assert_eq!(TagId::new("G-ABC123").unwrap().as_str(), "G-ABC123");
        assert!(TagId::new("UA-12345").is_none());
        assert!(TagId::new("G-").is_none());
    }
}
