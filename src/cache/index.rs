use super::key::segments;
use std::collections::{HashMap, HashSet};

/// Secondary index from key segment to the full keys containing it.
///
/// Kept in lockstep with the entry map so that entity invalidation is a
/// lookup instead of a scan.
#[derive(Debug, Default)]
pub(crate) struct SegmentIndex {
    by_segment: HashMap<String, HashSet<String>>,
}

impl SegmentIndex {
    pub(crate) fn insert(&mut self, key: &str) {
        for segment in segments(key) {
            self.by_segment
                .entry(segment.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        for segment in segments(key) {
            if let Some(keys) = self.by_segment.get_mut(segment) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_segment.remove(segment);
                }
            }
        }
    }

    pub(crate) fn keys_for(&self, segment: &str) -> Vec<String> {
        self.by_segment
            .get(segment)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.by_segment.clear();
    }

    #[cfg(test)]
    pub(crate) fn segment_count(&self) -> usize {
        self.by_segment.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_any_segment() {
        let mut index = SegmentIndex::default();
        index.insert("profile:u1");
        index.insert("skills:u1");
        index.insert("profile:u10");

        let mut keys = index.keys_for("u1");
        keys.sort();
        assert_eq!(keys, vec!["profile:u1", "skills:u1"]);
        assert_eq!(index.keys_for("profile").len(), 2);
        assert!(index.keys_for("u").is_empty());
    }

    #[test]
    fn remove_drops_empty_segments() {
        let mut index = SegmentIndex::default();
        index.insert("profile:u1");
        index.remove("profile:u1");
        assert_eq!(index.segment_count(), 0);

        // unknown keys are ignored
        index.remove("skills:u2");
        assert_eq!(index.segment_count(), 0);
    }
}
