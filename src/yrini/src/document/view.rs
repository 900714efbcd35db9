// yrini/src/document/view.rs

//! Inheritance-aware views over a section.
//!
//! A [`SectionView`] answers "what does this entity actually see": own pairs
//! first, then the linearized ancestors. A [`SectionViewMut`] writes own pairs
//! only, because that is all the game lets a section change.

use super::core::Document;
use super::section::{Section, INHERITS_KEY};
use crate::diagnostic::Diagnostic;
use crate::error::{IniError, Result};
use std::collections::HashSet;

/// Read-only view of one section plus the pairs it inherits.
#[derive(Debug, Clone)]
pub struct SectionView<'a> {
    document: &'a Document,
    name: String,
    section: &'a Section,
}

impl<'a> SectionView<'a> {
    pub(crate) fn new(document: &'a Document, name: &str, section: &'a Section) -> Self {
        Self {
            document,
            name: name.to_string(),
            section,
        }
    }

    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own pairs, without inheritance.
    pub fn own(&self) -> &'a Section {
        self.section
    }

    /// Declared parents, in priority order.
    pub fn parents(&self) -> &'a [String] {
        self.document.parents(&self.name)
    }

    /// Linearized ancestors using the document's resolution order.
    pub fn ancestors(&self) -> Vec<String> {
        self.document.ancestors(&self.name)
    }

    /// Find the section providing `key` and the value it provides.
    ///
    /// `$Inherits` is metadata and is only ever read from the section itself.
    pub fn find(&self, key: &str) -> Option<(String, &'a str)> {
        if let Some(value) = self.section.get(key) {
            return Some((self.name.clone(), value));
        }
        if key == INHERITS_KEY {
            return None;
        }
        self.ancestors().into_iter().find_map(|ancestor| {
            let value = self.document.own_section(&ancestor)?.get(key)?;
            Some((ancestor, value))
        })
    }

    /// Effective value of `key`: own pair first, then the first ancestor defining it.
    pub fn get(&self, key: &str) -> Result<&'a str> {
        self.find(key)
            .map(|(_, value)| value)
            .ok_or_else(|| IniError::key_not_found(self.name.as_str(), key))
    }

    /// Check if `key` is visible, either own or inherited.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Pairs visible only through ancestors, in linearization order.
    pub fn inherited_pairs(&self) -> Vec<(&'a str, &'a str)> {
        let mut seen: HashSet<&str> = self.section.keys().collect();
        let mut pairs = Vec::new();
        for ancestor in self.ancestors() {
            let Some(section) = self.document.own_section(&ancestor) else {
                continue;
            };
            for (key, value) in section.pairs() {
                if key != INHERITS_KEY && seen.insert(key) {
                    pairs.push((key, value));
                }
            }
        }
        pairs
    }

    /// Own keys first, then inherited-only keys, without duplicates.
    pub fn effective_keys(&self) -> Vec<&'a str> {
        self.effective_pairs().into_iter().map(|(k, _)| k).collect()
    }

    /// Flattened pairs: own pairs in order, then inherited-only pairs.
    pub fn effective_pairs(&self) -> Vec<(&'a str, &'a str)> {
        let mut pairs: Vec<_> = self.section.pairs().collect();
        pairs.extend(self.inherited_pairs());
        pairs
    }

    /// Distinct own values in insertion order, skipping empty values.
    pub fn ordered_unique_values(&self) -> Vec<&'a str> {
        self.section.ordered_unique_values()
    }
}

/// Mutable view of one section. Every write lands in the section's own pairs.
#[derive(Debug)]
pub struct SectionViewMut<'a> {
    document: &'a mut Document,
    name: String,
}

impl<'a> SectionViewMut<'a> {
    pub(crate) fn new(document: &'a mut Document, name: String) -> Self {
        Self { document, name }
    }

    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view of the same section.
    pub fn view(&self) -> SectionView<'_> {
        let section = self
            .document
            .own_section(&self.name)
            .unwrap_or_else(|| empty_section());
        SectionView::new(self.document, &self.name, section)
    }

    /// Effective value of `key`, following inheritance.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.view().get(key)
    }

    /// Mutable own pairs.
    pub fn own_mut(&mut self) -> &mut Section {
        self.document.insert_section(&self.name)
    }

    /// Create or overwrite an own pair in place. Returns the stored key.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> String {
        self.own_mut().set(key, value)
    }

    /// Attach an inline comment to an own pair.
    pub fn set_inline_comment<S: Into<String>>(&mut self, key: &str, comment: S) -> bool {
        self.own_mut().set_inline_comment(key, comment)
    }

    /// Append a standalone comment.
    pub fn push_comment<S: Into<String>>(&mut self, text: S) -> String {
        self.own_mut().push_comment(text)
    }

    /// Remove an own pair, returning its value.
    ///
    /// Removing a pair does not hide a value inherited from an ancestor. When
    /// the key stays visible a [`Diagnostic::ShadowedDelete`] is reported.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        let removed = self.own_mut().remove(key);
        if let Some((ancestor, _)) = self.view().find(key) {
            self.document.diagnostics().report(Diagnostic::ShadowedDelete {
                section: self.name.clone(),
                key: key.to_string(),
                ancestor,
            });
        }
        removed
    }
}

fn empty_section() -> &'static Section {
    static EMPTY: std::sync::OnceLock<Section> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Section::new)
}
