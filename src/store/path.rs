//! Store paths
//!
//! A `StorePath` is a `/`-separated list of keys addressing a node in the
//! hierarchical store, e.g. `loads/load1/voltage`. The empty path addresses
//! the root.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::{StoreError, StoreResult};

/// Characters that may not appear in a key
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^.#$\[\]/\x00-\x1f\x7f]+$").expect("valid key regex"))
}

/// Path to a node in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the tree
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path like `relays/relay1`. Leading and trailing slashes are
    /// ignored; empty inner segments are rejected.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_key(segment).map_err(|_| StoreError::InvalidPath(raw.to_string()))?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Path of a direct child
    pub fn child(&self, key: &str) -> StoreResult<Self> {
        validate_key(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last key, `None` for the root
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `self` equals `other` or lies above it in the tree
    pub fn contains(&self, other: &StorePath) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// True if the two paths lie on the same root-to-leaf line, i.e. a write
    /// at one can change the value observed at the other
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

/// Check a single key against the allowed character set
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key_pattern().is_match(key) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(key.to_string()))
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for StorePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StorePath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = StorePath::parse("/loads/load1/voltage/").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "loads/load1/voltage");
        assert_eq!(path.key(), Some("voltage"));
    }

    #[test]
    fn test_root() {
        assert!(StorePath::parse("").unwrap().is_root());
        assert!(StorePath::parse("/").unwrap().is_root());
        assert_eq!(StorePath::root().parent(), None);
    }

    #[test]
    fn test_invalid_keys() {
        assert!(StorePath::parse("relays//relay1").is_err());
        assert!(StorePath::parse("settings/unit.price").is_err());
        assert!(StorePath::parse("logs/daily/#1").is_err());
        assert!(StorePath::parse("logs/[x]").is_err());
        assert!(StorePath::root().child("a/b").is_err());
    }

    #[test]
    fn test_period_labels_are_valid_keys() {
        assert!(StorePath::parse("logs/daily/2024-01-01/load1/energy").is_ok());
        assert!(StorePath::parse("logs/weekly/2024-W01").is_ok());
    }

    #[test]
    fn test_contains_and_overlaps() {
        let relays = StorePath::parse("relays").unwrap();
        let relay1 = StorePath::parse("relays/relay1").unwrap();
        let loads = StorePath::parse("loads").unwrap();

        assert!(relays.contains(&relay1));
        assert!(!relay1.contains(&relays));
        assert!(relays.contains(&relays));
        assert!(relay1.overlaps(&relays));
        assert!(!relays.overlaps(&loads));
        assert!(StorePath::root().contains(&loads));
    }

    #[test]
    fn test_parent_and_child() {
        let path = StorePath::parse("timers/minutes").unwrap();
        let child = path.child("load3").unwrap();
        assert_eq!(child.to_string(), "timers/minutes/load3");
        assert_eq!(child.parent().unwrap(), path);
    }

    #[test]
    fn test_serde_as_string() {
        let path = StorePath::parse("relays/relay2").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"relays/relay2\"");
        let back: StorePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
