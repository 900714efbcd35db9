// yrini/src/lib.rs

//! Reader and writer for Red Alert 2 / Yuri's Revenge INI files.
//!
//! This library provides functionality to:
//! - Parse INI text with Ares `[Child]:[Parent]` and Phobos `$Inherits=A,B` inheritance
//! - Resolve inherited keys depth-first or breadth-first, with cycle and dangling-parent detection
//! - Compose `[#include]` trees, loading siblings concurrently with a deterministic merge order
//! - Auto-number `+=` registry entries and keep comments at their original positions
//! - Autodetect file encodings, falling back to GBK
//! - Write documents back, either preserving inheritance or flattening it away

pub mod composer;
pub mod diagnostic;
pub mod document;
pub mod encoding;
pub mod error;
pub mod inheritance;
pub mod parser;
pub mod pool;
pub mod values;
pub mod writer;

use std::io::Write;
use std::path::Path;

pub use composer::{ComposeOptions, ComposedTree, IncludeTreeComposer};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use document::{Document, Entry, Section, SectionView, SectionViewMut};
pub use encoding::{Decoded, EncodingSniffer};
pub use encoding_rs::Encoding;
pub use error::{IniError, Result};
pub use inheritance::{InheritanceResolver, Linearization, TraversalOrder};
pub use parser::Parser;
pub use pool::{FileSource, FsSource, InlinePool, RayonPool, WorkerPool};
pub use writer::{InheritanceStyle, WriteMode, WriteOptions, Writer};

/// Parse a single INI file, without following includes.
///
/// # Examples
///
/// ```no_run
/// fn main() -> Result<(), yrini::IniError> {
///     let rules = yrini::read("rulesmd.ini")?;
///     println!("{}", rules.get("GACNST", "Strength")?);
///     Ok(())
/// }
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs_err::read(path)?;
    let decoded = EncodingSniffer::new().decode(&bytes, path)?;
    Ok(Parser::new(&decoded.text)
        .with_source(path.display().to_string())
        .parse())
}

/// Parse INI text.
///
/// # Examples
///
/// ```
/// let doc = yrini::reads("[A]\nx=1\n[B]:[A]\ny=2\n");
/// assert_eq!(doc.get("B", "x").unwrap(), "1");
/// ```
pub fn reads(content: &str) -> Document {
    Parser::new(content).parse()
}

/// Decode and parse raw INI bytes.
pub fn read_bytes(bytes: &[u8]) -> Result<Document> {
    let label = Path::new("<bytes>");
    let decoded = EncodingSniffer::new().decode(bytes, label)?;
    Ok(Parser::new(&decoded.text).with_source("<bytes>").parse())
}

/// Read a root file and merge everything it includes, depth-first.
///
/// # Examples
///
/// ```no_run
/// fn main() -> Result<(), yrini::IniError> {
///     let rules = yrini::read_tree("mod/rulesmd.ini")?;
///     for diagnostic in rules.diagnostics().snapshot() {
///         eprintln!("{}", diagnostic);
///     }
///     Ok(())
/// }
/// ```
pub fn read_tree<P: AsRef<Path>>(root: P) -> Result<Document> {
    IncludeTreeComposer::default().read(root)
}

/// Render a document to text with default options.
pub fn writes(doc: &Document) -> String {
    Writer::default().render(doc)
}

/// Write a document to a file.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), yrini::IniError> {
/// let mut doc = yrini::Document::new();
/// doc.insert_section("GACNST").set("Strength", "1500");
///
/// yrini::write(&doc, "rulesmd.ini")?;
/// # Ok(())
/// # }
/// ```
pub fn write<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    write_with_options(doc, path, &WriteOptions::default())
}

/// Write a document to a file with specific options.
pub fn write_with_options<P: AsRef<Path>>(
    doc: &Document,
    path: P,
    options: &WriteOptions,
) -> Result<()> {
    Writer::new(options.clone()).write_file(doc, path)
}

/// Write a document to any writer implementing the Write trait.
pub fn write_to_writer<W: Write>(
    doc: &Document,
    writer: &mut W,
    options: &WriteOptions,
) -> Result<()> {
    Writer::new(options.clone()).write(doc, writer)
}

#[cfg(feature = "json")]
/// Convert a document to a JSON string.
pub fn to_json(doc: &Document) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(IniError::from)
}

#[cfg(feature = "json")]
/// Parse a document from a JSON string.
pub fn from_json(json: &str) -> Result<Document> {
    serde_json::from_str(json).map_err(IniError::from)
}
