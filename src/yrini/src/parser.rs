// yrini/src/parser.rs

//! Line-oriented parser for a single INI file.
//!
//! Parsing never fails. Anything the engine would not understand is kept as a
//! comment (so no text is lost) and reported as a
//! [`Diagnostic::MalformedLine`].

use crate::diagnostic::Diagnostic;
use crate::document::{Document, Section, INHERITS_KEY, PLUS_KEY};
use std::collections::HashSet;

/// Default key-value separator.
pub const DEFAULT_SEPARATOR: char = '=';

const COMMENT_MARKER: char = ';';
const ESCAPE: char = '\\';

/// Parses decoded text into a partial [`Document`].
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    input: &'a str,
    separator: char,
    source: String,
}

/// One classified line.
#[derive(Debug, Clone, PartialEq)]
enum Line<'l> {
    Heading {
        name: &'l str,
        parent: Option<&'l str>,
        summary: Option<&'l str>,
        problem: Option<&'static str>,
    },
    Pair {
        key: &'l str,
        value: &'l str,
        comment: Option<&'l str>,
    },
    Comment(&'l str),
    Blank,
    Malformed {
        text: &'l str,
        reason: &'static str,
    },
}

impl<'a> Parser<'a> {
    /// Create a parser over decoded text.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            separator: DEFAULT_SEPARATOR,
            source: "<string>".to_string(),
        }
    }

    /// Set the key-value separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Set the file label used in diagnostics.
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }

    /// Parse the whole input.
    pub fn parse(&self) -> Document {
        let mut doc = Document::new();
        let mut current: Option<String> = None;
        // Sections whose parents came from `$Inherits` in this file
        let mut phobos: HashSet<String> = HashSet::new();

        let input = self.input.strip_prefix('\u{feff}').unwrap_or(self.input);
        for (index, raw) in input.lines().enumerate() {
            let line_number = index + 1;
            match self.classify(raw) {
                Line::Blank => {}
                Line::Heading {
                    name,
                    parent,
                    summary,
                    problem,
                } => {
                    if let Some(reason) = problem {
                        self.malformed(&doc, line_number, raw, reason);
                    }
                    let section = doc.insert_section(name);
                    if let Some(summary) = summary {
                        section.set_summary(Some(summary.to_string()));
                    }
                    if let Some(parent) = parent {
                        if !phobos.contains(name) {
                            doc.set_parents(name, [parent]);
                        }
                    }
                    current = Some(name.to_string());
                }
                Line::Pair { key, value, comment } => {
                    let target = target_section(&mut doc, current.as_deref());
                    let stored = if key == PLUS_KEY {
                        target.push_plus(value)
                    } else {
                        target.set(key, value)
                    };
                    if let Some(comment) = comment {
                        target.set_inline_comment(&stored, comment);
                    }
                    if key == INHERITS_KEY {
                        if let Some(name) = current.as_deref() {
                            doc.set_parents(name, split_parents(value));
                            phobos.insert(name.to_string());
                        }
                    }
                }
                Line::Comment(text) => {
                    target_section(&mut doc, current.as_deref()).push_comment(text);
                }
                Line::Malformed { text, reason } => {
                    self.malformed(&doc, line_number, raw, reason);
                    target_section(&mut doc, current.as_deref()).push_comment(text);
                }
            }
        }

        log::trace!(
            "parsed {}: {} sections, {} inheritance entries",
            self.source,
            doc.len(),
            doc.inheritance().count()
        );
        doc
    }

    fn malformed(&self, doc: &Document, line: usize, raw: &str, reason: &str) {
        doc.diagnostics().report(Diagnostic::MalformedLine {
            file: self.source.clone(),
            line,
            text: raw.trim().to_string(),
            reason: reason.to_string(),
        });
    }

    fn classify<'l>(&self, raw: &'l str) -> Line<'l> {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }
        if let Some(rest) = line.strip_prefix('[') {
            return classify_heading(rest);
        }

        let comment_at = find_comment(line);
        let separator_at = line
            .find(self.separator)
            .filter(|&at| comment_at.map_or(true, |c| at < c));
        if let Some(at) = separator_at {
            let key = line[..at].trim();
            if key.is_empty() {
                return Line::Malformed {
                    text: line,
                    reason: "pair without a key",
                };
            }
            let (value, comment) = split_comment(&line[at + self.separator.len_utf8()..]);
            return Line::Pair {
                key,
                value: value.trim(),
                comment: comment.filter(|c| !c.trim().is_empty()),
            };
        }

        if let Some(text) = line.strip_prefix(COMMENT_MARKER) {
            return Line::Comment(text);
        }
        Line::Malformed {
            text: line,
            reason: "line is neither a heading, a pair nor a comment",
        }
    }
}

fn classify_heading(rest: &str) -> Line<'_> {
    let Some(close) = rest.find(']') else {
        // Unterminated: everything up to the comment is the name
        let (name, summary) = split_comment(rest);
        return heading(
            name.trim(),
            None,
            summary,
            Some("unterminated section heading"),
        );
    };

    let name = rest[..close].trim();
    let mut after = &rest[close + 1..];
    let mut parent = None;
    let mut problem = None;

    if let Some(tail) = after.trim_start().strip_prefix(':') {
        let tail = tail.trim_start();
        match tail.strip_prefix('[') {
            Some(bracketed) => match bracketed.find(']') {
                Some(end) => {
                    parent = Some(bracketed[..end].trim());
                    after = &bracketed[end + 1..];
                }
                None => {
                    let (text, _) = split_comment(bracketed);
                    parent = Some(text.trim());
                    after = &bracketed[text.len()..];
                    problem = Some("unterminated parent heading");
                }
            },
            None => {
                let (text, _) = split_comment(tail);
                parent = Some(text.trim());
                after = &tail[text.len()..];
                problem = Some("parent name is not bracketed");
            }
        }
    }

    let after = after.trim();
    let summary = after.strip_prefix(COMMENT_MARKER).or(Some(after));
    let parent = parent.filter(|p| !p.is_empty());
    heading(name, parent, summary, problem)
}

/// A nameless heading still opens a section (keyed `""`), so the pairs under
/// it never land in the section before it.
fn heading<'l>(
    name: &'l str,
    parent: Option<&'l str>,
    summary: Option<&'l str>,
    problem: Option<&'static str>,
) -> Line<'l> {
    let problem = if name.is_empty() {
        Some("section heading without a name")
    } else {
        problem
    };
    Line::Heading {
        name,
        parent,
        summary: summary.filter(|s| !s.trim().is_empty()),
        problem,
    }
}

fn target_section<'d>(doc: &'d mut Document, current: Option<&str>) -> &'d mut Section {
    match current {
        Some(name) => doc.insert_section(name),
        None => doc.header_mut(),
    }
}

/// Byte offset of the first `;` not preceded by a backslash.
fn find_comment(text: &str) -> Option<usize> {
    let mut previous = None;
    for (at, c) in text.char_indices() {
        if c == COMMENT_MARKER && previous != Some(ESCAPE) {
            return Some(at);
        }
        previous = Some(c);
    }
    None
}

/// Split at the first unescaped `;`. The comment excludes the marker.
fn split_comment(text: &str) -> (&str, Option<&str>) {
    match find_comment(text) {
        Some(at) => (&text[..at], Some(&text[at + COMMENT_MARKER.len_utf8()..])),
        None => (text, None),
    }
}

/// Split a `$Inherits` value into parent names, in priority order.
pub fn split_parents(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
