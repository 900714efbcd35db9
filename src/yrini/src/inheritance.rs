// yrini/src/inheritance.rs

//! Ancestor linearization over the inheritance map.
//!
//! Both `[Child]:[Parent]` and `$Inherits=A,B` end up in the same
//! name → parents map, so one resolver serves both. Parents are listed in
//! priority order; the linearization decides how grandparents interleave.

use crate::diagnostic::Diagnostic;
use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// How ancestors (and include trees) are walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalOrder {
    /// Left-to-right pre-order: each parent is fully expanded before the next
    #[default]
    DepthFirst,
    /// Level by level: every parent at one depth before any grandparent
    BreadthFirst,
}

/// Result of linearizing one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linearization {
    /// Ancestors in lookup priority order, without duplicates and without
    /// the section itself
    pub ancestors: Vec<String>,
    /// Dangling parents and cycles met on the way
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes ancestor lists for sections of a document.
#[derive(Debug, Clone, Copy)]
pub struct InheritanceResolver<'a> {
    document: &'a Document,
    order: TraversalOrder,
}

struct Walk<'s> {
    start: &'s str,
    seen: HashSet<String>,
    result: Linearization,
}

impl<'s> Walk<'s> {
    fn new(start: &'s str) -> Self {
        Self {
            start,
            seen: HashSet::new(),
            result: Linearization::default(),
        }
    }

    fn cycle(&mut self, via: &str, parent: &str) {
        self.result.diagnostics.push(Diagnostic::InheritanceCycle {
            section: self.start.to_string(),
            via: via.to_string(),
            parent: parent.to_string(),
        });
    }

    fn dangling(&mut self, section: &str, parent: &str) {
        self.result.diagnostics.push(Diagnostic::DanglingParent {
            section: section.to_string(),
            parent: parent.to_string(),
        });
    }

    /// Record a new ancestor. Returns `false` if it was already recorded.
    fn accept(&mut self, parent: &str) -> bool {
        if !self.seen.insert(parent.to_string()) {
            return false;
        }
        self.result.ancestors.push(parent.to_string());
        true
    }
}

impl<'a> InheritanceResolver<'a> {
    /// Create a depth-first resolver over a document.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            order: TraversalOrder::default(),
        }
    }

    /// Set the traversal order.
    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    /// Linearize the ancestors of `name`.
    ///
    /// Always terminates: nodes already on the active path are not descended
    /// into, and every ancestor is expanded at most once.
    pub fn linearize(&self, name: &str) -> Linearization {
        let mut walk = Walk::new(name);
        match self.order {
            TraversalOrder::DepthFirst => {
                let mut path = vec![name.to_string()];
                self.depth_first(name, &mut path, &mut walk);
            }
            TraversalOrder::BreadthFirst => self.breadth_first(name, &mut walk),
        }
        walk.result
    }

    fn depth_first(&self, node: &str, path: &mut Vec<String>, walk: &mut Walk<'_>) {
        for parent in self.document.parents(node) {
            if path.iter().any(|p| p == parent) {
                walk.cycle(node, parent);
                continue;
            }
            if !self.document.has_section(parent) {
                walk.dangling(node, parent);
                continue;
            }
            if !walk.accept(parent) {
                continue;
            }
            path.push(parent.clone());
            self.depth_first(parent, path, walk);
            path.pop();
        }
    }

    fn breadth_first(&self, start: &str, walk: &mut Walk<'_>) {
        let mut queue = VecDeque::new();
        queue.push_back((start.to_string(), vec![start.to_string()]));

        while let Some((node, path)) = queue.pop_front() {
            for parent in self.document.parents(&node) {
                if path.iter().any(|p| p == parent) {
                    walk.cycle(&node, parent);
                    continue;
                }
                if !self.document.has_section(parent) {
                    walk.dangling(&node, parent);
                    continue;
                }
                if walk.accept(parent) {
                    let mut next = path.clone();
                    next.push(parent.clone());
                    queue.push_back((parent.clone(), next));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Document {
        let mut doc = Document::new();
        doc.insert_section("A").set("k", "a");
        doc.insert_section("B");
        doc.insert_section("C").set("k", "c");
        doc.insert_section("D");
        doc.set_parents("B", ["A"]);
        doc.set_parents("C", ["A"]);
        doc.set_parents("D", ["B", "C"]);
        doc
    }

    #[test]
    fn test_depth_first_diamond() {
        let doc = diamond();
        let lin = InheritanceResolver::new(&doc).linearize("D");
        assert_eq!(lin.ancestors, vec!["B", "A", "C"]);
        assert!(lin.diagnostics.is_empty());
        assert_eq!(doc.get("D", "k").unwrap(), "a");
    }

    #[test]
    fn test_breadth_first_diamond() {
        let doc = diamond().with_resolution_order(TraversalOrder::BreadthFirst);
        let lin = InheritanceResolver::new(&doc)
            .with_order(TraversalOrder::BreadthFirst)
            .linearize("D");
        assert_eq!(lin.ancestors, vec!["B", "C", "A"]);
        assert_eq!(doc.get("D", "k").unwrap(), "c");
    }

    #[test]
    fn test_cycle_terminates_and_excludes_start() {
        let mut doc = Document::new();
        doc.insert_section("A").set("a", "1");
        doc.insert_section("B").set("b", "2");
        doc.set_parents("A", ["B"]);
        doc.set_parents("B", ["A"]);

        for order in [TraversalOrder::DepthFirst, TraversalOrder::BreadthFirst] {
            let lin = InheritanceResolver::new(&doc).with_order(order).linearize("A");
            assert_eq!(lin.ancestors, vec!["B"]);
            assert_eq!(
                lin.diagnostics,
                vec![Diagnostic::InheritanceCycle {
                    section: "A".to_string(),
                    via: "B".to_string(),
                    parent: "A".to_string(),
                }]
            );
        }
        assert_eq!(doc.get("A", "b").unwrap(), "2");
    }

    #[test]
    fn test_self_parent() {
        let mut doc = Document::new();
        doc.insert_section("A");
        doc.set_parents("A", ["A"]);

        let lin = InheritanceResolver::new(&doc).linearize("A");
        assert!(lin.ancestors.is_empty());
        assert_eq!(lin.diagnostics.len(), 1);
    }

    #[test]
    fn test_dangling_parent_skipped() {
        let mut doc = Document::new();
        doc.insert_section("P").set("x", "1");
        doc.insert_section("C");
        doc.set_parents("C", ["Ghost", "P"]);

        let lin = InheritanceResolver::new(&doc).linearize("C");
        assert_eq!(lin.ancestors, vec!["P"]);
        assert_eq!(
            lin.diagnostics,
            vec![Diagnostic::DanglingParent {
                section: "C".to_string(),
                parent: "Ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_nested_cycle_away_from_start() {
        let mut doc = Document::new();
        for name in ["S", "X", "Y"] {
            doc.insert_section(name);
        }
        doc.set_parents("S", ["X"]);
        doc.set_parents("X", ["Y"]);
        doc.set_parents("Y", ["X"]);

        let lin = InheritanceResolver::new(&doc).linearize("S");
        assert_eq!(lin.ancestors, vec!["X", "Y"]);
        assert!(matches!(
            lin.diagnostics.as_slice(),
            [Diagnostic::InheritanceCycle { via, parent, .. }] if via == "Y" && parent == "X"
        ));
    }
}
