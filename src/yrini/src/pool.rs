// yrini/src/pool.rs

//! Pluggable executors and byte sources for loading include trees.
//!
//! The composer hands a batch of sibling paths to a [`WorkerPool`] and gets
//! the results back in input order, whatever order the workers finished in.

use crate::error::Result;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs one job per path and returns the results in input order.
pub trait WorkerPool: Send + Sync {
    fn map<T, F>(&self, paths: &[PathBuf], job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync;
}

/// Runs every job on the calling thread, one after another.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn map<T, F>(&self, paths: &[PathBuf], job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync,
    {
        paths.iter().map(|path| job(path.as_path())).collect()
    }
}

/// Runs jobs on rayon, either the global pool or a dedicated one.
#[derive(Debug, Clone, Default)]
pub struct RayonPool {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonPool {
    /// Use rayon's global pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dedicated pool with `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("yrini-loader-{}", i))
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Number of worker threads jobs will run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl WorkerPool for RayonPool {
    fn map<T, F>(&self, paths: &[PathBuf], job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync,
    {
        let run = || -> Vec<T> { paths.par_iter().map(|path| job(path.as_path())).collect() };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

/// Where file bytes come from.
pub trait FileSource: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs_err::read(path)
    }
}
