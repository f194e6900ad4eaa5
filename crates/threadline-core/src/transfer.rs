//! Download destination resolution.
//!
//! Before an incoming file transfer starts, a local destination must be
//! chosen. Collisions with existing files resolve by prepending an
//! increasing integer (`1_name`, `2_name`, ...) until an unused path is
//! found. Resolution is deterministic and side-effect-free apart from
//! the existence checks, which go through the injected [`FileProbe`] so
//! the actual filesystem stays an external collaborator.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Existence checks against whatever holds the downloaded files.
///
/// The only side channel of collision resolution. Production uses
/// [`DiskProbe`]; tests use an in-memory set.
pub trait FileProbe {
    /// True if something already exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Resolve a collision-free destination for `name` inside `dir`.
///
/// Tries `name`, then `1_name`, `2_name`, ... until the probe reports
/// the path unused. Retries are unbounded, matching the behavior this
/// replaces.
pub fn resolve_unique_path(probe: &impl FileProbe, dir: &Path, name: &str) -> PathBuf {
    let mut path = dir.join(name);
    let mut prefix = 1u64;
    while probe.exists(&path) {
        let renamed = format!("{prefix}_{name}");
        warn!(%name, %renamed, "file with that name already exists, renamed");
        path = dir.join(renamed);
        prefix += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct FakeFs(HashSet<PathBuf>);

    impl FileProbe for FakeFs {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn fs_with(paths: &[&str]) -> FakeFs {
        FakeFs(paths.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn free_name_is_used_as_is() {
        let fs = fs_with(&[]);
        assert_eq!(
            resolve_unique_path(&fs, Path::new("/dl"), "photo.jpg"),
            PathBuf::from("/dl/photo.jpg")
        );
    }

    #[test]
    fn collision_prepends_counter() {
        let fs = fs_with(&["/dl/photo.jpg"]);
        assert_eq!(
            resolve_unique_path(&fs, Path::new("/dl"), "photo.jpg"),
            PathBuf::from("/dl/1_photo.jpg")
        );
    }

    #[test]
    fn counter_skips_taken_prefixes() {
        let fs = fs_with(&["/dl/photo.jpg", "/dl/1_photo.jpg"]);
        assert_eq!(
            resolve_unique_path(&fs, Path::new("/dl"), "photo.jpg"),
            PathBuf::from("/dl/2_photo.jpg")
        );
    }
}
