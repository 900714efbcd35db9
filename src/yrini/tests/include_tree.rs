// yrini/tests/include_tree.rs

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use yrini::error::Result;
use yrini::{
    ComposeOptions, Diagnostic, FileSource, FsSource, IncludeTreeComposer, InlinePool, RayonPool,
    TraversalOrder, WriteMode, WriteOptions, Writer,
};

fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Lay out a small mod tree:
///
/// rulesmd.ini includes INI\rules_a.ini and INI/rules_b.ini;
/// rules_a.ini includes INI\rules_c.ini.
fn write_tree(dir: &Path) -> io::Result<PathBuf> {
    fs_err::create_dir_all(dir.join("INI"))?;
    fs_err::write(
        dir.join("rulesmd.ini"),
        "[#include]\n1=INI\\rules_a.ini\n2=INI/rules_b.ini\n\n\
         [InfantryTypes]\n0=E1\n\n\
         [E1]\nStrength=125\nCost=100\n",
    )?;
    fs_err::write(
        dir.join("INI").join("rules_a.ini"),
        "[#include]\n1=INI\\rules_c.ini\n\n\
         [InfantryTypes]\n+=SEAL\n\n\
         [E1]\nStrength=150\n\n\
         [SEAL]:[E1]\nCost=1000\n",
    )?;
    fs_err::write(
        dir.join("INI").join("rules_b.ini"),
        "[InfantryTypes]\n+=E2\n\n[E1]\nStrength=175\n",
    )?;
    fs_err::write(
        dir.join("INI").join("rules_c.ini"),
        "[InfantryTypes]\n+=TANY\n\n[E1]\nStrength=200\n",
    )?;
    Ok(dir.join("rulesmd.ini"))
}

fn file_names(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn depth_first_tree_precedence() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let root = write_tree(dir.path())?;

    let tree = IncludeTreeComposer::default().compose(&root)?;

    assert_eq!(
        file_names(&tree.files),
        vec!["rulesmd.ini", "rules_a.ini", "rules_c.ini", "rules_b.ini"]
    );
    assert_eq!(tree.document.get("E1", "Strength")?, "175");
    assert_eq!(
        tree.document.type_list("InfantryTypes"),
        vec!["E1", "SEAL", "TANY", "E2"]
    );
    assert_eq!(tree.document.get("SEAL", "Strength")?, "175");
    assert_eq!(tree.document.get("SEAL", "Cost")?, "1000");
    Ok(())
}

#[test]
fn breadth_first_tree_precedence() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let root = write_tree(dir.path())?;

    let composer = IncludeTreeComposer::new(
        ComposeOptions::new().with_order(TraversalOrder::BreadthFirst),
    );
    let tree = composer.compose(&root)?;

    assert_eq!(
        file_names(&tree.files),
        vec!["rulesmd.ini", "rules_a.ini", "rules_b.ini", "rules_c.ini"]
    );
    assert_eq!(tree.document.get("E1", "Strength")?, "200");
    assert_eq!(
        tree.document.type_list("InfantryTypes"),
        vec!["E1", "SEAL", "E2", "TANY"]
    );
    Ok(())
}

#[test]
fn missing_include_is_skipped() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    fs_err::write(
        dir.path().join("rulesmd.ini"),
        "[#include]\n0=INI\\absent.ini\n[E1]\nStrength=125\n",
    )?;

    let doc = yrini::read_tree(dir.path().join("rulesmd.ini"))?;

    assert_eq!(doc.get("E1", "Strength")?, "125");
    let diagnostics = doc.diagnostics().snapshot();
    assert!(matches!(
        diagnostics.as_slice(),
        [Diagnostic::MissingInclude { path, .. }] if path.ends_with("INI/absent.ini")
    ));
    Ok(())
}

#[test]
fn unreadable_root_is_fatal() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let result = yrini::read_tree(dir.path().join("nope.ini"));
    assert!(matches!(result, Err(yrini::IniError::Io(_))));
}

#[test]
fn include_cycle_terminates() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    fs_err::write(dir.path().join("a.ini"), "[#include]\n0=b.ini\n[A]\nx=1\n")?;
    fs_err::write(dir.path().join("b.ini"), "[#include]\n0=a.ini\n[A]\nx=2\n")?;

    let tree = IncludeTreeComposer::default().compose(dir.path().join("a.ini"))?;

    assert_eq!(file_names(&tree.files), vec!["a.ini", "b.ini"]);
    assert_eq!(tree.document.get("A", "x")?, "2");
    assert!(tree
        .document
        .diagnostics()
        .any(|d| matches!(d, Diagnostic::RepeatedInclude { .. })));
    Ok(())
}

/// File system reads with a per-file delay, so later siblings finish first.
struct SlowSource {
    delays: Vec<(String, u64)>,
}

impl FileSource for SlowSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let delay = self
            .delays
            .iter()
            .find(|(file, _)| *file == name)
            .map_or(0, |(_, ms)| *ms);
        thread::sleep(Duration::from_millis(delay));
        FsSource.read(path)
    }
}

#[test]
fn merge_is_deterministic_under_latency() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let root = write_tree(dir.path())?;
    let flatten = Writer::new(WriteOptions::new().with_mode(WriteMode::Flattened));

    let reference = IncludeTreeComposer::default()
        .with_pool(InlinePool)
        .compose(&root)?;
    let expected = flatten.render(&reference.document);

    let schedules = [
        vec![("rules_a.ini", 40), ("rules_b.ini", 0), ("rules_c.ini", 0)],
        vec![("rules_a.ini", 0), ("rules_b.ini", 40), ("rules_c.ini", 20)],
        vec![("rulesmd.ini", 10), ("rules_a.ini", 25), ("rules_b.ini", 5)],
    ];
    for schedule in schedules {
        let source = SlowSource {
            delays: schedule
                .into_iter()
                .map(|(f, ms)| (f.to_string(), ms))
                .collect(),
        };
        let tree = IncludeTreeComposer::default()
            .with_pool(RayonPool::with_threads(4)?)
            .with_source(source)
            .compose(&root)?;

        assert_eq!(tree.files, reference.files);
        assert_eq!(flatten.render(&tree.document), expected);
        assert_eq!(tree.document, reference.document);
    }
    Ok(())
}
