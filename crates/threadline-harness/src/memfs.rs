//! In-memory filesystem probe.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use threadline_core::FileProbe;

/// [`FileProbe`] over a fixed set of paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    present: HashSet<PathBuf>,
}

impl MemoryFs {
    /// An empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filesystem pre-populated with the given paths.
    pub fn with_paths<I, T>(paths: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PathBuf>,
    {
        Self { present: paths.into_iter().map(Into::into).collect() }
    }

    /// Mark a path as existing.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.present.insert(path.into());
    }
}

impl FileProbe for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.present.contains(path)
    }
}
