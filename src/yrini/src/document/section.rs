// yrini/src/document/section.rs

//! Own-pair storage for a single INI section (or the header).

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Key written by Ares' fast-append syntax (`+= value`).
pub const PLUS_KEY: &str = "+";

/// Prefix of the synthetic keys that `+` entries are stored under.
///
/// A parsed key never contains `=`, so these can never collide with a real key.
pub const PLUS_KEY_PREFIX: &str = "+=";

/// Prefix of the synthetic keys that standalone comments are stored under.
///
/// A parsed key never contains `;`, so these can never collide with a real key.
pub const COMMENT_KEY_PREFIX: &str = ";";

/// Key carrying Phobos multi-parent inheritance.
pub const INHERITS_KEY: &str = "$Inherits";

/// Check if a key is a synthetic standalone-comment key.
pub fn is_comment_key(key: &str) -> bool {
    key.starts_with(COMMENT_KEY_PREFIX)
}

/// Check if a key is a synthetic `+` key.
pub fn is_plus_key(key: &str) -> bool {
    key.starts_with(PLUS_KEY_PREFIX)
}

/// One stored line of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Value of the pair; `None` for a standalone comment
    pub value: Option<String>,
    /// Inline comment after the value, or the text of a standalone comment
    /// (without the leading `;`)
    pub comment: Option<String>,
}

impl Entry {
    /// A plain key-value entry.
    pub fn pair<S: Into<String>>(value: S) -> Self {
        Self {
            value: Some(value.into()),
            comment: None,
        }
    }

    /// A standalone comment entry.
    pub fn standalone_comment<S: Into<String>>(text: S) -> Self {
        Self {
            value: None,
            comment: Some(text.into()),
        }
    }

    /// Check if this entry is a standalone comment.
    pub fn is_comment(&self) -> bool {
        self.value.is_none()
    }
}

/// Ordered own pairs of a section, plus comments at their original positions.
///
/// A `Section` never contains inherited pairs; see
/// [`SectionView`](super::SectionView) for inheritance-aware lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    entries: LinkedHashMap<String, Entry>,
    /// Free text after the heading, e.g. `; Allied Construction Yard`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip)]
    next_plus: usize,
    #[serde(skip)]
    next_comment: usize,
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.summary == other.summary
    }
}

impl Section {
    /// Create a new empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an own value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|e| e.value.as_deref())
    }

    /// Check if an own pair exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Create or overwrite an own pair.
    ///
    /// Overwriting keeps the pair at its original position and keeps its
    /// inline comment. Setting key `+` appends a new auto-numbered pair.
    /// Synthetic comment keys are not pairs and are left untouched.
    /// Returns the key the value was stored under.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> String {
        let key = key.into();
        if key == PLUS_KEY {
            return self.push_plus(value);
        }
        if is_comment_key(&key) {
            log::debug!("refusing to set comment key {key} as a pair");
            return key;
        }
        match self.entries.get_mut(&key) {
            Some(entry) => entry.value = Some(value.into()),
            None => {
                self.entries.insert(key.clone(), Entry::pair(value));
            }
        }
        key
    }

    /// Builder-style [`set`](Self::set).
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Append a `+ = value` pair under the next free synthetic key.
    pub fn push_plus<V: Into<String>>(&mut self, value: V) -> String {
        let key = self.next_free_key(PLUS_KEY_PREFIX, SyntheticKind::Plus);
        self.entries.insert(key.clone(), Entry::pair(value));
        key
    }

    /// Append a standalone comment (text without the leading `;`).
    pub fn push_comment<S: Into<String>>(&mut self, text: S) -> String {
        let key = self.next_free_key(COMMENT_KEY_PREFIX, SyntheticKind::Comment);
        self.entries
            .insert(key.clone(), Entry::standalone_comment(text));
        key
    }

    fn next_free_key(&mut self, prefix: &str, kind: SyntheticKind) -> String {
        let counter = match kind {
            SyntheticKind::Plus => &mut self.next_plus,
            SyntheticKind::Comment => &mut self.next_comment,
        };
        loop {
            let key = format!("{}{}", prefix, *counter);
            *counter += 1;
            if !self.entries.contains_key(&key) {
                return key;
            }
        }
    }

    /// Remove an own pair, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        if is_comment_key(key) {
            return None;
        }
        self.entries.remove(key).and_then(|e| e.value)
    }

    /// Attach an inline comment to an existing pair. Returns `false` if the
    /// key has no own pair.
    pub fn set_inline_comment<S: Into<String>>(&mut self, key: &str, comment: S) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_comment() => {
                entry.comment = Some(comment.into());
                true
            }
            _ => false,
        }
    }

    /// Get the inline comment of a pair.
    pub fn inline_comment(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|e| !e.is_comment())
            .and_then(|e| e.comment.as_deref())
    }

    /// Own keys in order, excluding synthetic comment keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(|(k, _)| k)
    }

    /// Own values in order, excluding comments.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(|(_, v)| v)
    }

    /// Own key-value pairs in order, excluding comments.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, e)| e.value.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Every stored entry in order, including standalone comments.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, Entry)> {
        self.entries.into_iter()
    }

    /// Standalone comment texts in order.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|e| e.is_comment())
            .filter_map(|e| e.comment.as_deref())
    }

    /// Number of own pairs (comments excluded).
    pub fn len(&self) -> usize {
        self.pairs().count()
    }

    /// Check if the section has no pairs and no comments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything except the summary.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_plus = 0;
        self.next_comment = 0;
    }

    /// Get the heading summary.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Set or clear the heading summary.
    pub fn set_summary(&mut self, summary: Option<String>) {
        self.summary = summary;
    }

    /// Distinct own values in insertion order, skipping empty values.
    ///
    /// This is how the engine reads "registry" sections such as
    /// `[BuildingTypes]`: the keys are irrelevant and the first occurrence of a
    /// type name wins.
    pub fn ordered_unique_values(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.values()
            .filter(|v| !v.is_empty())
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Sort pairs with a comparator over `(key, value)`.
    ///
    /// Standalone comments travel with the pair that follows them; trailing
    /// comments stay at the end.
    pub fn sort_pairs_by<F>(&mut self, mut compare: F)
    where
        F: FnMut((&str, &str), (&str, &str)) -> Ordering,
    {
        let mut blocks: Vec<(Vec<(String, Entry)>, (String, Entry))> = Vec::new();
        let mut pending = Vec::new();
        let mut trailing = Vec::new();
        for (key, entry) in std::mem::take(&mut self.entries) {
            if entry.is_comment() {
                pending.push((key, entry));
            } else {
                blocks.push((std::mem::take(&mut pending), (key, entry)));
            }
        }
        trailing.append(&mut pending);

        blocks.sort_by(|(_, (ka, ea)), (_, (kb, eb))| {
            let va = ea.value.as_deref().unwrap_or_default();
            let vb = eb.value.as_deref().unwrap_or_default();
            compare((ka.as_str(), va), (kb.as_str(), vb))
        });

        for (comments, (key, entry)) in blocks {
            for (ck, ce) in comments {
                self.entries.insert(ck, ce);
            }
            self.entries.insert(key, entry);
        }
        for (ck, ce) in trailing {
            self.entries.insert(ck, ce);
        }
    }
}

enum SyntheticKind {
    Plus,
    Comment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_comment_keys() {
        let mut section = Section::new();
        let key = section.push_comment(" keep me");
        section.set("Cost", "100");

        assert_eq!(section.set(key.clone(), "oops"), key);
        assert_eq!(section.len(), 1);
        assert_eq!(section.get(&key), None);
        assert_eq!(section.comments().collect::<Vec<_>>(), vec![" keep me"]);
        assert!(section.entries().next().is_some_and(|(_, e)| e.is_comment()));
    }

    #[test]
    fn test_set_preserves_position() {
        let mut section = Section::new();
        section.set("Strength", "1000");
        section.set("Armor", "concrete");
        section.set("Strength", "1500");

        let keys: Vec<_> = section.keys().collect();
        assert_eq!(keys, vec!["Strength", "Armor"]);
        assert_eq!(section.get("Strength"), Some("1500"));
    }

    #[test]
    fn test_plus_keys_are_distinct() {
        let mut section = Section::new();
        let first = section.set("+", "a");
        let second = section.set("+", "b");

        assert_ne!(first, second);
        assert!(is_plus_key(&first));
        assert_eq!(section.get(&first), Some("a"));
        assert_eq!(section.get(&second), Some("b"));
        assert_eq!(section.ordered_unique_values(), vec!["a", "b"]);
    }

    #[test]
    fn test_comment_keys_hidden_from_iteration() {
        let mut section = Section::new();
        section.set("Name", "Allied Construction Yard");
        let comment_key = section.push_comment(" factory");
        section.set("Cost", "3000");

        assert!(is_comment_key(&comment_key));
        assert_eq!(section.len(), 2);
        assert!(section.keys().all(|k| !is_comment_key(k)));
        assert_eq!(section.get(&comment_key), None);
        assert_eq!(section.comments().collect::<Vec<_>>(), vec![" factory"]);
        assert_eq!(section.entries().count(), 3);
    }

    #[test]
    fn test_ordered_unique_values() {
        let section = Section::new()
            .with("0", "GACNST")
            .with("1", "")
            .with("2", "GAPOWR")
            .with("3", "GACNST")
            .with("4", "NACNST");

        assert_eq!(
            section.ordered_unique_values(),
            vec!["GACNST", "GAPOWR", "NACNST"]
        );
    }

    #[test]
    fn test_inline_comment() {
        let mut section = Section::new();
        section.set("Cost", "3000");
        assert!(section.set_inline_comment("Cost", " expensive"));
        assert!(!section.set_inline_comment("Missing", "nope"));

        section.set("Cost", "2500");
        assert_eq!(section.inline_comment("Cost"), Some(" expensive"));
    }

    #[test]
    fn test_remove_ignores_comment_keys() {
        let mut section = Section::new();
        let key = section.push_comment("keep me");
        section.set("A", "1");

        assert_eq!(section.remove(&key), None);
        assert_eq!(section.remove("A"), Some("1".to_string()));
        assert_eq!(section.comments().count(), 1);
    }

    #[test]
    fn test_sort_pairs_keeps_comments_attached() {
        let mut section = Section::new();
        section.set("b", "2");
        section.push_comment("about a");
        section.set("a", "1");
        section.push_comment("trailing");

        section.sort_pairs_by(|(ka, _), (kb, _)| ka.cmp(kb));

        let order: Vec<_> = section
            .entries()
            .map(|(k, e)| {
                if e.is_comment() {
                    e.comment.clone().unwrap_or_default()
                } else {
                    k.to_string()
                }
            })
            .collect();
        assert_eq!(order, vec!["about a", "a", "b", "trailing"]);
    }

    #[test]
    fn test_synthetic_numbering_skips_taken_keys() {
        let mut section = Section::new();
        section.set("+=0", "manual");
        let key = section.push_plus("auto");
        assert_eq!(key, "+=1");
    }
}
