// yrini/src/document/merging.rs

//! Merging one parsed file into an accumulated document.
//!
//! This is the engine's "last loaded wins" rule: a later file overwrites
//! header keys and section keys in place, adds new sections at the end, and
//! replaces the parent list of any section it declares inheritance for. A
//! merged `$Inherits` pair outranks any colon parent, whichever file held it.

use super::core::Document;
use super::section::{is_plus_key, Section, INHERITS_KEY};
use crate::diagnostic::Diagnostic;
use crate::parser::split_parents;

impl Document {
    /// Merge `other` into this document.
    ///
    /// `file` names the source of `other` in diagnostics. Overwriting a key with
    /// a different value is reported; `+` entries and standalone comments are
    /// appended under fresh synthetic keys so that several files can add to the
    /// same registry section.
    pub fn merge(&mut self, other: Document, file: &str) {
        let (header, sections, inheritance, incoming) = other.into_parts();

        if !incoming.same_sink(self.diagnostics()) {
            self.diagnostics().extend(incoming.take());
        }

        let diagnostics = self.diagnostics().clone();
        merge_section(self.header_mut(), header, |key, old, new| {
            diagnostics.report(Diagnostic::HeaderKeyOverwritten {
                key: key.to_string(),
                old: old.to_string(),
                new: new.to_string(),
                file: file.to_string(),
            })
        });

        let mut touched: Vec<String> = Vec::with_capacity(sections.len());
        for (name, section) in sections {
            touched.push(name.clone());
            let target = self.insert_section(&name);
            merge_section(target, section, |key, _, _| {
                diagnostics.report(Diagnostic::SectionKeyOverwritten {
                    section: name.clone(),
                    key: key.to_string(),
                    file: file.to_string(),
                })
            });
        }

        for (name, parents) in inheritance {
            self.set_parents(&name, parents);
            touched.push(name);
        }

        for name in touched {
            let declared = self
                .own_section(&name)
                .and_then(|section| section.get(INHERITS_KEY))
                .map(split_parents);
            if let Some(parents) = declared {
                self.set_parents(&name, parents);
            }
        }
    }

    /// Builder-style [`merge`](Self::merge).
    pub fn merged(mut self, other: Document, file: &str) -> Self {
        self.merge(other, file);
        self
    }
}

fn merge_section<F>(target: &mut Section, incoming: Section, mut on_overwrite: F)
where
    F: FnMut(&str, &str, &str),
{
    if let Some(summary) = incoming.summary().filter(|s| !s.trim().is_empty()) {
        target.set_summary(Some(summary.to_string()));
    }

    for (key, entry) in incoming.into_entries() {
        let Some(value) = entry.value else {
            if let Some(text) = entry.comment {
                target.push_comment(text);
            }
            continue;
        };

        let stored = if is_plus_key(&key) {
            target.push_plus(value)
        } else {
            if let Some(old) = target.get(&key) {
                if old != value {
                    on_overwrite(key.as_str(), old, value.as_str());
                }
            }
            target.set(key, value)
        };

        if let Some(comment) = entry.comment {
            target.set_inline_comment(&stored, comment);
        }
    }
}
