// yrini/src/composer.rs

//! Loading and merging `[#include]` trees.
//!
//! Every file may list further files in its includes section. The composer
//! walks that tree from a root file, loads each batch of siblings (DFS) or each
//! level (BFS) concurrently on a [`WorkerPool`], and merges the results one at
//! a time in traversal order. Load timing therefore never changes the result.

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::Document;
use crate::encoding::EncodingSniffer;
use crate::error::{IniError, Result};
use crate::inheritance::TraversalOrder;
use crate::parser::{Parser, DEFAULT_SEPARATOR};
use crate::pool::{FileSource, FsSource, RayonPool, WorkerPool};
use encoding_rs::Encoding;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Section listing included files, as read by Ares.
pub const DEFAULT_INCLUDES_SECTION: &str = "#include";

/// Options for reading an include tree.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Include traversal order
    pub order: TraversalOrder,
    /// Ancestor linearization of the composed document
    pub inheritance_order: TraversalOrder,
    /// Section whose values name included files
    pub includes_section: String,
    /// Follow includes at all
    pub search_includes: bool,
    /// Key-value separator
    pub separator: char,
    /// Encoding to try before autodetection
    pub encoding: Option<&'static Encoding>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            order: TraversalOrder::DepthFirst,
            inheritance_order: TraversalOrder::DepthFirst,
            includes_section: DEFAULT_INCLUDES_SECTION.to_string(),
            search_includes: true,
            separator: DEFAULT_SEPARATOR,
            encoding: None,
        }
    }
}

impl ComposeOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set include traversal order.
    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the ancestor linearization of the composed document.
    pub fn with_inheritance_order(mut self, order: TraversalOrder) -> Self {
        self.inheritance_order = order;
        self
    }

    /// Set the includes section name.
    pub fn with_includes_section<S: Into<String>>(mut self, name: S) -> Self {
        self.includes_section = name.into();
        self
    }

    /// Enable or disable include search.
    pub fn with_includes(mut self, search: bool) -> Self {
        self.search_includes = search;
        self
    }

    /// Set the key-value separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Set the encoding tried before autodetection.
    pub fn with_encoding(mut self, encoding: Option<&'static Encoding>) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A composed include tree.
#[derive(Debug, Clone)]
pub struct ComposedTree {
    /// Merged document
    pub document: Document,
    /// Files merged into the document, in merge order
    pub files: Vec<PathBuf>,
}

/// Loads a root file and everything it includes.
#[derive(Debug, Clone)]
pub struct IncludeTreeComposer<P: WorkerPool = RayonPool, S: FileSource = FsSource> {
    options: ComposeOptions,
    pool: P,
    source: S,
}

impl IncludeTreeComposer {
    /// Create a composer reading the file system on rayon's global pool.
    pub fn new(options: ComposeOptions) -> Self {
        Self {
            options,
            pool: RayonPool::new(),
            source: FsSource,
        }
    }
}

impl Default for IncludeTreeComposer {
    fn default() -> Self {
        Self::new(ComposeOptions::default())
    }
}

/// Bookkeeping for one composition.
#[derive(Default)]
struct ComposeState {
    document: Document,
    files: Vec<PathBuf>,
    merged: HashSet<PathBuf>,
    missing: HashSet<PathBuf>,
    pending: HashMap<PathBuf, Result<Document>>,
}

impl<P: WorkerPool, S: FileSource> IncludeTreeComposer<P, S> {
    /// Replace the worker pool.
    pub fn with_pool<Q: WorkerPool>(self, pool: Q) -> IncludeTreeComposer<Q, S> {
        IncludeTreeComposer {
            options: self.options,
            pool,
            source: self.source,
        }
    }

    /// Replace the byte source.
    pub fn with_source<T: FileSource>(self, source: T) -> IncludeTreeComposer<P, T> {
        IncludeTreeComposer {
            options: self.options,
            pool: self.pool,
            source,
        }
    }

    /// Get the options.
    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Load, decode and parse one file. Runs on a worker.
    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = self.source.read(path)?;
        let decoded = EncodingSniffer::new()
            .with_preferred(self.options.encoding)
            .decode(&bytes, path)?;
        log::debug!("loaded {} ({})", path.display(), decoded.encoding.name());
        Ok(Parser::new(&decoded.text)
            .with_separator(self.options.separator)
            .with_source(path.display().to_string())
            .parse())
    }

    /// Read a root file and merge its include tree.
    ///
    /// An unreadable root or any undecodable file is fatal. Unreadable
    /// includes are skipped with [`Diagnostic::MissingInclude`].
    pub fn compose<R: AsRef<Path>>(&self, root: R) -> Result<ComposedTree> {
        let root = normalize(root.as_ref());
        let base = root.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!(
            "composing {} ({:?} includes)",
            root.display(),
            self.options.order
        );

        let root_document = self.load(&root)?;
        let includes = self.includes_of(&root_document, &base);

        let mut state = ComposeState {
            document: Document::new().with_resolution_order(self.options.inheritance_order),
            ..ComposeState::default()
        };
        state.merged.insert(root.clone());
        merge_into(&mut state, root_document, &root);

        match self.options.order {
            TraversalOrder::DepthFirst => self.depth_first(includes, &base, &mut state)?,
            TraversalOrder::BreadthFirst => self.breadth_first(includes, &base, &mut state)?,
        }

        log::debug!(
            "composed {} from {} files",
            root.display(),
            state.files.len()
        );
        Ok(ComposedTree {
            document: state.document,
            files: state.files,
        })
    }

    /// Read a root file and merge its include tree, keeping only the document.
    pub fn read<R: AsRef<Path>>(&self, root: R) -> Result<Document> {
        self.compose(root).map(|tree| tree.document)
    }

    /// Merge explicitly listed fragments into `document`, in order.
    ///
    /// Relative fragment paths resolve against `base`. Includes declared by
    /// the fragments are not followed. Returns the files actually merged.
    pub fn merge_fragments<I, T>(
        &self,
        document: &mut Document,
        base: &Path,
        fragments: I,
    ) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let paths: Vec<PathBuf> = dedupe(
            fragments
                .into_iter()
                .map(|f| resolve(base, f.as_ref()))
                .collect(),
        );
        let loads = self.pool.map(&paths, |path| self.load(path));

        let mut files = Vec::new();
        for (path, load) in paths.into_iter().zip(loads) {
            match load {
                Ok(fragment) => {
                    document.merge(fragment, &path.display().to_string());
                    files.push(path);
                }
                Err(IniError::Io(e)) => missing(document.diagnostics(), &path, &e),
                Err(e) => return Err(e),
            }
        }
        Ok(files)
    }

    fn includes_of(&self, document: &Document, base: &Path) -> Vec<PathBuf> {
        if !self.options.search_includes {
            return Vec::new();
        }
        dedupe(
            document
                .type_list(&self.options.includes_section)
                .into_iter()
                .map(|value| resolve(base, value))
                .collect(),
        )
    }

    /// Load every not-yet-seen path of a batch concurrently.
    fn load_batch(&self, batch: &[PathBuf], state: &mut ComposeState) {
        let wanted: Vec<PathBuf> = batch
            .iter()
            .filter(|p| {
                !state.merged.contains(*p)
                    && !state.missing.contains(*p)
                    && !state.pending.contains_key(*p)
            })
            .cloned()
            .collect();
        if wanted.is_empty() {
            return;
        }
        let loads = self.pool.map(&wanted, |path| self.load(path));
        state.pending.extend(wanted.into_iter().zip(loads));
    }

    /// Merge one loaded file. Returns its includes, or `None` if it was skipped.
    fn merge_next(
        &self,
        path: &Path,
        base: &Path,
        state: &mut ComposeState,
    ) -> Result<Option<Vec<PathBuf>>> {
        if state.merged.contains(path) {
            state.document.diagnostics().report(Diagnostic::RepeatedInclude {
                path: path.to_path_buf(),
            });
            return Ok(None);
        }
        if state.missing.contains(path) {
            return Ok(None);
        }
        let load = match state.pending.remove(path) {
            Some(load) => load,
            None => self.load(path),
        };
        match load {
            Ok(document) => {
                let includes = self.includes_of(&document, base);
                state.merged.insert(path.to_path_buf());
                merge_into(state, document, path);
                Ok(Some(includes))
            }
            Err(IniError::Io(e)) => {
                missing(state.document.diagnostics(), path, &e);
                state.missing.insert(path.to_path_buf());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Pre-order: each child's subtree is merged before its next sibling.
    fn depth_first(
        &self,
        children: Vec<PathBuf>,
        base: &Path,
        state: &mut ComposeState,
    ) -> Result<()> {
        self.load_batch(&children, state);
        for child in children {
            if let Some(grandchildren) = self.merge_next(&child, base, state)? {
                self.depth_first(grandchildren, base, state)?;
            }
        }
        Ok(())
    }

    /// Level by level: every file at one depth before any of their includes.
    fn breadth_first(
        &self,
        mut level: Vec<PathBuf>,
        base: &Path,
        state: &mut ComposeState,
    ) -> Result<()> {
        while !level.is_empty() {
            self.load_batch(&level, state);
            let mut next = Vec::new();
            for path in level {
                if let Some(includes) = self.merge_next(&path, base, state)? {
                    next.extend(includes);
                }
            }
            level = next;
        }
        Ok(())
    }
}

fn merge_into(state: &mut ComposeState, document: Document, path: &Path) {
    log::debug!("merging {}", path.display());
    state.document.merge(document, &path.display().to_string());
    state.files.push(path.to_path_buf());
}

fn missing(diagnostics: &Diagnostics, path: &Path, error: &std::io::Error) {
    diagnostics.report(Diagnostic::MissingInclude {
        path: path.to_path_buf(),
        reason: error.to_string(),
    });
}

/// Resolve an include value against the root directory.
///
/// Both `\` and `/` separate components, so Windows-authored trees work
/// anywhere.
pub fn resolve(base: &Path, value: &str) -> PathBuf {
    let value = value.trim();
    if Path::new(value).is_absolute() {
        return normalize(Path::new(value));
    }
    let mut path = base.to_path_buf();
    for part in value.split(['\\', '/']).filter(|p| !p.is_empty()) {
        path.push(part);
    }
    normalize(&path)
}

/// Lexically drop `.` and fold `..` so one file has one identity.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn dedupe(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}
