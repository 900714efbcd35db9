// yrini/src/document/core.rs

//! Core Document struct and basic operations.

use super::section::Section;
use super::view::{SectionView, SectionViewMut};
use crate::diagnostic::Diagnostics;
use crate::error::{IniError, Result};
use crate::inheritance::{InheritanceResolver, TraversalOrder};
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete INI document, or the merged result of an include tree.
///
/// Sections hold their own pairs only. Inheritance lives in a separate
/// name → parents map fed by both `[Child]:[Parent]` headings and
/// `$Inherits=` pairs, and is resolved on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Pairs preceding the first heading
    header: Section,
    /// Sections keyed by name, in declaration order
    sections: LinkedHashMap<String, Section>,
    /// Section name to ordered parent names
    inheritance: LinkedHashMap<String, Vec<String>>,
    /// Linearization used by lookups
    #[serde(skip)]
    resolution: TraversalOrder,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.sections == other.sections
            && self.inheritance == other.inheritance
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document reporting into an existing diagnostics sink.
    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    /// Set the ancestor linearization used by lookups.
    pub fn with_resolution_order(mut self, order: TraversalOrder) -> Self {
        self.resolution = order;
        self
    }

    /// Get the ancestor linearization used by lookups.
    pub fn resolution_order(&self) -> TraversalOrder {
        self.resolution
    }

    /// Set the ancestor linearization used by lookups.
    pub fn set_resolution_order(&mut self, order: TraversalOrder) {
        self.resolution = order;
    }

    /// Diagnostics reported while building, resolving or writing this document.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Pairs that precede the first section heading.
    pub fn header(&self) -> &Section {
        &self.header
    }

    /// Mutable access to the header pairs.
    pub fn header_mut(&mut self) -> &mut Section {
        &mut self.header
    }

    /// Insert a new section (if absent) and return a mutable reference to its own pairs.
    pub fn insert_section(&mut self, name: &str) -> &mut Section {
        self.sections
            .entry(name.to_string())
            .or_insert_with(Section::new)
    }

    /// Insert a section object directly, replacing any existing one in place.
    pub fn insert_section_object(&mut self, name: &str, section: Section) {
        match self.sections.get_mut(name) {
            Some(existing) => *existing = section,
            None => {
                self.sections.insert(name.to_string(), section);
            }
        }
    }

    /// Get an inheritance-aware view of a section.
    pub fn section(&self, name: &str) -> Option<SectionView<'_>> {
        let section = self.sections.get(name)?;
        Some(SectionView::new(self, name, section))
    }

    /// Get an inheritance-aware mutable view of a section.
    pub fn section_mut(&mut self, name: &str) -> Option<SectionViewMut<'_>> {
        if self.sections.contains_key(name) {
            Some(SectionViewMut::new(self, name.to_string()))
        } else {
            None
        }
    }

    /// Own pairs of a section, without inheritance.
    pub fn own_section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Mutable own pairs of a section.
    pub fn own_section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Check if a section is declared.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Remove a section and its inheritance entry.
    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        self.inheritance.remove(name);
        self.sections.remove(name)
    }

    /// Rename a section, keeping its position and inheritance entry.
    ///
    /// Fails (returns `false`) if `old` is missing or `new` already exists.
    /// Other sections naming `old` as a parent are left untouched.
    pub fn rename_section(&mut self, old: &str, new: &str) -> bool {
        if !self.sections.contains_key(old) || self.sections.contains_key(new) {
            return false;
        }
        let sections = std::mem::take(&mut self.sections);
        self.sections = sections
            .into_iter()
            .map(|(name, section)| {
                if name == old {
                    (new.to_string(), section)
                } else {
                    (name, section)
                }
            })
            .collect();
        if let Some(parents) = self.inheritance.remove(old) {
            self.inheritance.insert(new.to_string(), parents);
        }
        true
    }

    /// Section names in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|k| k.as_str())
    }

    /// Iterate over sections (own pairs) in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Get the number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the document has no header pairs and no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.header.is_empty()
    }

    /// Remove all sections, header pairs and inheritance entries.
    pub fn clear(&mut self) {
        self.header.clear();
        self.sections.clear();
        self.inheritance.clear();
    }

    /// Declared parents of a section, in priority order.
    pub fn parents(&self, name: &str) -> &[String] {
        self.inheritance
            .get(name)
            .map(|p| p.as_slice())
            .unwrap_or_default()
    }

    /// Replace the parent list of a section.
    pub fn set_parents<I, S>(&mut self, name: &str, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parents: Vec<String> = parents.into_iter().map(Into::into).collect();
        match self.inheritance.get_mut(name) {
            Some(existing) => *existing = parents,
            None => {
                self.inheritance.insert(name.to_string(), parents);
            }
        }
    }

    /// Drop the inheritance entry of a section.
    pub fn remove_parents(&mut self, name: &str) -> Option<Vec<String>> {
        self.inheritance.remove(name)
    }

    /// Check if a section has an inheritance entry (possibly empty).
    pub fn has_inheritance(&self, name: &str) -> bool {
        self.inheritance.contains_key(name)
    }

    /// The whole inheritance map, in declaration order.
    pub fn inheritance(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inheritance
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Linearized ancestors of a section using the document's order.
    ///
    /// Dangling parents and cycles are skipped and reported to
    /// [`diagnostics`](Self::diagnostics).
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        self.ancestors_with(name, self.resolution)
    }

    /// Linearized ancestors of a section using an explicit order.
    pub fn ancestors_with(&self, name: &str, order: TraversalOrder) -> Vec<String> {
        let linearization = InheritanceResolver::new(self).with_order(order).linearize(name);
        self.diagnostics.extend(linearization.diagnostics);
        linearization.ancestors
    }

    /// Effective value of `key` in `section`, following inheritance.
    pub fn get(&self, section: &str, key: &str) -> Result<&str> {
        self.section(section)
            .ok_or_else(|| IniError::SectionNotFound(section.to_string()))?
            .get(key)
    }

    /// Find which section provides `key` for `section`, and the value it provides.
    pub fn find(&self, section: &str, key: &str) -> Option<(String, &str)> {
        self.section(section)?.find(key)
    }

    /// Ordered distinct values of a registry section such as `[InfantryTypes]`.
    ///
    /// Returns an empty list if the section is not declared.
    pub fn type_list(&self, section: &str) -> Vec<&str> {
        self.sections
            .get(section)
            .map(|s| s.ordered_unique_values())
            .unwrap_or_default()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Section,
        LinkedHashMap<String, Section>,
        LinkedHashMap<String, Vec<String>>,
        Diagnostics,
    ) {
        (self.header, self.sections, self.inheritance, self.diagnostics)
    }

    pub(crate) fn sections_map(&self) -> &LinkedHashMap<String, Section> {
        &self.sections
    }

    pub(crate) fn inheritance_map(&self) -> &LinkedHashMap<String, Vec<String>> {
        &self.inheritance
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::writer::Writer::new(crate::writer::WriteOptions::default()).render(self);
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Diagnostic;

    fn inheritance_fixture() -> Document {
        let mut doc = Document::new();
        doc.insert_section("A").set("x", "1");
        doc.insert_section("A").set("y", "2");
        doc.insert_section("B").set("y", "3");
        doc.set_parents("B", ["A"]);
        doc
    }

    #[test]
    fn test_get_through_inheritance() {
        let doc = inheritance_fixture();
        assert_eq!(doc.get("B", "x").unwrap(), "1");
        assert_eq!(doc.get("B", "y").unwrap(), "3");
        assert_eq!(doc.find("B", "x"), Some(("A".to_string(), "1")));
        assert!(matches!(
            doc.get("B", "z"),
            Err(IniError::KeyNotFound { .. })
        ));
        assert!(matches!(
            doc.get("Nope", "x"),
            Err(IniError::SectionNotFound(_))
        ));
    }

    #[test]
    fn test_multi_parent_priority() {
        let mut doc = Document::new();
        doc.insert_section("P").set("k", "p");
        doc.insert_section("Q").set("k", "q");
        doc.insert_section("C");
        doc.set_parents("C", ["P", "Q"]);

        assert_eq!(doc.get("C", "k").unwrap(), "p");
    }

    #[test]
    fn test_dangling_parent_reported() {
        let mut doc = Document::new();
        doc.insert_section("D").set("a", "1");
        doc.set_parents("D", ["Ghost"]);

        assert!(doc.ancestors("D").is_empty());
        assert!(doc.diagnostics().any(|d| matches!(
            d,
            Diagnostic::DanglingParent { section, parent } if section == "D" && parent == "Ghost"
        )));
    }

    #[test]
    fn test_remove_section_drops_inheritance() {
        let mut doc = inheritance_fixture();
        assert!(doc.remove_section("B").is_some());
        assert!(!doc.has_inheritance("B"));
        assert!(doc.parents("B").is_empty());
    }

    #[test]
    fn test_rename_section() {
        let mut doc = inheritance_fixture();
        doc.insert_section("C");

        assert!(doc.rename_section("B", "Renamed"));
        assert!(!doc.rename_section("Missing", "Other"));
        assert!(!doc.rename_section("A", "C"));

        let names: Vec<_> = doc.section_names().collect();
        assert_eq!(names, vec!["A", "Renamed", "C"]);
        assert_eq!(doc.parents("Renamed").to_vec(), vec!["A".to_string()]);
        assert_eq!(doc.get("Renamed", "x").unwrap(), "1");
    }

    #[test]
    fn test_type_list() {
        let mut doc = Document::new();
        let types = doc.insert_section("InfantryTypes");
        types.set("0", "E1");
        types.set("1", "E2");
        types.set("2", "E1");
        types.set("+", "SEAL");

        assert_eq!(doc.type_list("InfantryTypes"), vec!["E1", "E2", "SEAL"]);
        assert!(doc.type_list("VehicleTypes").is_empty());
    }

    #[test]
    fn test_equality_ignores_diagnostics() {
        let a = inheritance_fixture();
        let b = inheritance_fixture();
        b.diagnostics().report(Diagnostic::RepeatedInclude {
            path: "x.ini".into(),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear() {
        let mut doc = inheritance_fixture();
        doc.header_mut().set("Name", "rules");
        doc.clear();
        assert!(doc.is_empty());
        assert_eq!(doc.inheritance().count(), 0);
    }
}
