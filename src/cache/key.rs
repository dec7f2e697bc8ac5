//! Cache key naming.
//!
//! Keys follow the `"<facet>:<entityId>"` convention, e.g. `profile:u1` or
//! `skills:u1`. Every `:`-separated segment of a key is indexed so that all
//! facets of one entity can be invalidated together.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between key segments.
pub const KEY_DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a `facet:entity` key.
    pub fn new(facet: impl AsRef<str>, entity: impl AsRef<str>) -> Self {
        Self(format!(
            "{}{}{}",
            facet.as_ref(),
            KEY_DELIMITER,
            entity.as_ref()
        ))
    }

    /// Wrap an already formatted key.
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Append a further segment, e.g. a page number or variant.
    pub fn with_segment(mut self, segment: impl AsRef<str>) -> Self {
        self.0.push(KEY_DELIMITER);
        self.0.push_str(segment.as_ref());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First segment.
    pub fn facet(&self) -> &str {
        self.0.split(KEY_DELIMITER).next().unwrap_or_default()
    }

    /// Everything after the first delimiter, if any.
    pub fn entity(&self) -> Option<&str> {
        self.0
            .split_once(KEY_DELIMITER)
            .map(|(_, entity)| entity)
    }
}

/// Non-empty, de-duplicated segments of a key.
pub(crate) fn segments(key: &str) -> impl Iterator<Item = &str> + '_ {
    let mut seen: Vec<&str> = Vec::new();
    key.split(KEY_DELIMITER).filter(move |s| {
        if s.is_empty() || seen.contains(s) {
            return false;
        }
        seen.push(*s);
        true
    })
}

/// Whether `fragment` lines up with whole segments of `key`.
///
/// The fragment's segments must appear as a contiguous run in the key, so
/// `profile:` matches `profile:u1` and `skills:u1` matches only that key,
/// while `file:u` matches neither `profile:u1` nor `file:u10`.
pub(crate) fn matches_segments(key: &str, fragment: &str) -> bool {
    let run = fragment.trim_matches(KEY_DELIMITER);
    if run.is_empty() {
        return false;
    }
    let padded_key = format!("{d}{key}{d}", d = KEY_DELIMITER);
    let needle = format!("{d}{run}{d}", d = KEY_DELIMITER);
    padded_key.contains(&needle)
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::raw(s)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
