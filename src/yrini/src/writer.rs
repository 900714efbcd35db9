// yrini/src/writer.rs

//! Rendering documents back to INI text.
//!
//! Two modes: [`WriteMode::Preserving`] keeps inheritance declarations and
//! comments so the output reads like the input, [`WriteMode::Flattened`]
//! bakes inherited pairs into every section so the output needs no
//! inheritance support at all.

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::{is_plus_key, Document, Section, INHERITS_KEY, PLUS_KEY};
use crate::encoding;
use crate::error::{IniError, Result};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// What happens to inheritance on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep own pairs and inheritance declarations
    #[default]
    Preserving,
    /// Emit own pairs followed by inherited-only pairs, without declarations
    Flattened,
}

/// How inheritance is declared in preserving mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InheritanceStyle {
    /// `[Child]:[Parent]` for one parent, `$Inherits=` for several or when
    /// the section already uses it
    #[default]
    Auto,
    /// Only `[Child]:[Parent]`; sections with several parents lose their
    /// declaration
    Colon,
    /// Always `$Inherits=`
    Key,
}

/// Options for controlling INI output.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Inheritance handling
    pub mode: WriteMode,
    /// Declaration syntax in preserving mode
    pub inheritance_style: InheritanceStyle,
    /// Text between key and value
    pub separator: String,
    /// Empty lines between the header and each section
    pub blank_lines: usize,
    /// Emit standalone comments, inline comments and heading summaries
    pub comments: bool,
    /// Force overwrite existing files
    pub force: bool,
    /// Output encoding (UTF-8 when unset)
    pub encoding: Option<&'static Encoding>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::Preserving,
            inheritance_style: InheritanceStyle::Auto,
            separator: "=".to_string(),
            blank_lines: 1,
            comments: true,
            force: false,
            encoding: None,
        }
    }
}

impl WriteOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write mode.
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the inheritance declaration style.
    pub fn with_inheritance_style(mut self, style: InheritanceStyle) -> Self {
        self.inheritance_style = style;
        self
    }

    /// Set the key-value separator.
    pub fn with_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the number of empty lines between blocks.
    pub fn with_blank_lines(mut self, blank_lines: usize) -> Self {
        self.blank_lines = blank_lines;
        self
    }

    /// Enable or disable comment output.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    /// Allow overwriting existing files.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the output encoding.
    pub fn with_encoding(mut self, encoding: Option<&'static Encoding>) -> Self {
        self.encoding = encoding;
        self
    }
}

/// What to do with an own `$Inherits` pair.
enum InheritsPair {
    /// Header pairs carry no inheritance; write as stored
    Verbatim,
    /// Write this value, in place of the own pair or first if there is none
    Replace(String),
    /// Leave it out
    Drop,
}

/// Renders documents with fixed options.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    options: WriteOptions,
}

impl Writer {
    /// Create a writer.
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Render a document to text.
    ///
    /// Inheritance problems met while rendering are reported to the
    /// document's diagnostics.
    pub fn render(&self, doc: &Document) -> String {
        let mut blocks = Vec::with_capacity(doc.len() + 1);
        if !doc.header().is_empty() {
            let mut block = String::new();
            let scope = Scope::new(doc, "");
            self.render_entries(&mut block, &scope, doc.header(), InheritsPair::Verbatim);
            blocks.push(block);
        }
        for (name, section) in doc.sections() {
            blocks.push(self.render_section(doc, name, section));
        }
        if blocks.is_empty() {
            return String::new();
        }

        let gap = "\n".repeat(self.options.blank_lines);
        let mut out = String::new();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                out.push_str(&gap);
            }
            out.push_str(block);
        }
        out
    }

    /// Render and write to any writer, in the configured encoding.
    pub fn write<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<()> {
        let bytes = self.encode(doc, Path::new("<writer>"))?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Render and write to a file.
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn write_file<P: AsRef<Path>>(&self, doc: &Document, path: P) -> Result<()> {
        let path = path.as_ref();
        if !self.options.force && path.exists() {
            return Err(IniError::FileAlreadyExists(path.to_path_buf()));
        }
        let bytes = self.encode(doc, path)?;
        fs_err::write(path, bytes)?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }

    fn encode(&self, doc: &Document, path: &Path) -> Result<Vec<u8>> {
        let text = self.render(doc);
        match self.options.encoding {
            Some(target) => encoding::encode(&text, target, path),
            None => Ok(text.into_bytes()),
        }
    }

    fn render_section(&self, doc: &Document, name: &str, section: &Section) -> String {
        let mut out = format!("[{}]", name);

        let inherits = match self.options.mode {
            WriteMode::Flattened => InheritsPair::Drop,
            WriteMode::Preserving => self.declaration(doc, name, section, &mut out),
        };

        if self.options.comments {
            if let Some(summary) = section.summary() {
                out.push_str(" ;");
                out.push_str(summary);
            }
        }
        out.push('\n');

        let scope = Scope::new(doc, name);
        self.render_entries(&mut out, &scope, section, inherits);

        if self.options.mode == WriteMode::Flattened {
            if let Some(view) = doc.section(name) {
                for (key, value) in view.inherited_pairs() {
                    self.push_pair(&mut out, &scope, key, value, None);
                }
            }
        }
        out
    }

    /// Append a colon declaration to the heading, or decide the `$Inherits` pair.
    fn declaration(
        &self,
        doc: &Document,
        name: &str,
        section: &Section,
        heading: &mut String,
    ) -> InheritsPair {
        if !doc.has_inheritance(name) {
            return InheritsPair::Drop;
        }
        let parents = doc.parents(name);
        let key_form = match self.options.inheritance_style {
            InheritanceStyle::Auto => parents.len() > 1 || section.contains_key(INHERITS_KEY),
            InheritanceStyle::Colon => false,
            InheritanceStyle::Key => true,
        };
        if key_form {
            return InheritsPair::Replace(parents.join(","));
        }

        match parents {
            [] => {}
            [parent] => {
                heading.push_str(":[");
                heading.push_str(parent);
                heading.push(']');
            }
            _ => doc
                .diagnostics()
                .report(Diagnostic::AmbiguousColonInheritance {
                    section: name.to_string(),
                    parents: parents.to_vec(),
                }),
        }
        InheritsPair::Drop
    }

    fn render_entries(
        &self,
        out: &mut String,
        scope: &Scope<'_>,
        section: &Section,
        inherits: InheritsPair,
    ) {
        if let InheritsPair::Replace(value) = &inherits {
            if !section.contains_key(INHERITS_KEY) {
                self.push_pair(out, scope, INHERITS_KEY, value, None);
            }
        }

        for (key, entry) in section.entries() {
            let Some(value) = entry.value.as_deref() else {
                if self.options.comments {
                    out.push(';');
                    out.push_str(entry.comment.as_deref().unwrap_or_default());
                    out.push('\n');
                }
                continue;
            };
            let comment = entry.comment.as_deref();
            if key == INHERITS_KEY {
                match &inherits {
                    InheritsPair::Verbatim => self.push_pair(out, scope, key, value, comment),
                    InheritsPair::Replace(replacement) => {
                        self.push_pair(out, scope, key, replacement, comment)
                    }
                    InheritsPair::Drop => {}
                }
                continue;
            }
            self.push_pair(out, scope, key, value, comment);
        }
    }

    fn push_pair(
        &self,
        out: &mut String,
        scope: &Scope<'_>,
        key: &str,
        value: &str,
        comment: Option<&str>,
    ) {
        let value = match escape_value(value) {
            Cow::Owned(escaped) => {
                scope.diagnostics.report(Diagnostic::ValueEscaped {
                    section: scope.section.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                });
                Cow::Owned(escaped)
            }
            borrowed => borrowed,
        };
        out.push_str(if is_plus_key(key) { PLUS_KEY } else { key });
        out.push_str(&self.options.separator);
        out.push_str(&value);
        if let Some(comment) = comment.filter(|_| self.options.comments) {
            out.push_str(" ;");
            out.push_str(comment);
        }
        out.push('\n');
    }
}

/// Where pairs are being written, for diagnostics. The header is `""`.
struct Scope<'d> {
    diagnostics: &'d Diagnostics,
    section: &'d str,
}

impl<'d> Scope<'d> {
    fn new(doc: &'d Document, section: &'d str) -> Self {
        Self {
            diagnostics: doc.diagnostics(),
            section,
        }
    }
}

/// Make a value safe to write on one line.
///
/// An unescaped `;` would start a comment on re-read, so it gains a `\`.
/// Line breaks become spaces.
fn escape_value(value: &str) -> Cow<'_, str> {
    let mut previous = None;
    let clean = value.chars().all(|c| {
        let ok = !matches!(c, '\n' | '\r') && !(c == ';' && previous != Some('\\'));
        previous = Some(c);
        ok
    });
    if clean {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    let mut previous = None;
    for c in value.chars() {
        match c {
            '\n' | '\r' => escaped.push(' '),
            ';' if previous != Some('\\') => escaped.push_str("\\;"),
            _ => escaped.push(c),
        }
        previous = Some(c);
    }
    Cow::Owned(escaped)
}
