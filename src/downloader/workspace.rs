//! Run-scoped temporary storage.
//!
//! A run owns one temp directory; every track works inside its own
//! randomly named subdirectory of it. Both are removed when dropped, so
//! cancellation and early returns clean up without extra bookkeeping.
//! A track that must leave its file behind (failed tagging) keeps its
//! directory, which in turn keeps the run directory alive.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;

const RUN_PREFIX: &str = "downmixer-";

pub struct RunWorkspace {
    dir: TempDir,
    retained: Arc<AtomicBool>,
}

impl RunWorkspace {
    /// Create the run directory under `temp_root`, or the system temp dir.
    pub fn create(temp_root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(RUN_PREFIX);
        let dir = match temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!("Run workspace at {:?}", dir.path());

        Ok(Self {
            dir,
            retained: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Handle workers use to create their own scratch directories.
    pub fn scratch_space(&self) -> ScratchSpace {
        ScratchSpace {
            root: self.dir.path().to_path_buf(),
            retained: Arc::clone(&self.retained),
        }
    }

    /// Tear down the run directory.
    ///
    /// Returns its path instead when a track kept files inside it.
    pub fn finish(self) -> io::Result<Option<PathBuf>> {
        if self.retained.load(Ordering::Acquire) {
            let path = self.dir.keep();
            tracing::warn!("Keeping run workspace {:?} (contains untagged files)", path);
            Ok(Some(path))
        } else {
            self.dir.close()?;
            Ok(None)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
    retained: Arc<AtomicBool>,
}

impl ScratchSpace {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn track_dir(&self, index: usize) -> io::Result<TrackScratch> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{:04}-", index))
            .tempdir_in(&self.root)?;
        Ok(TrackScratch {
            dir,
            retained: Arc::clone(&self.retained),
        })
    }
}

/// One track's working directory.
#[derive(Debug)]
pub struct TrackScratch {
    dir: TempDir,
    retained: Arc<AtomicBool>,
}

impl TrackScratch {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stop cleanup of this directory and of the run directory around it.
    pub fn keep(self) -> PathBuf {
        self.retained.store(true, Ordering::Release);
        self.dir.keep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(Some(root.path())).unwrap();
        let run_dir = workspace.path().to_path_buf();

        let scratch = workspace.scratch_space().track_dir(0).unwrap();
        std::fs::write(scratch.path().join("raw.webm"), b"data").unwrap();
        drop(scratch);

        assert!(workspace.finish().unwrap().is_none());
        assert!(!run_dir.exists());
    }

    #[test]
    fn test_dropped_scratch_is_removed() {
        let workspace = RunWorkspace::create(None).unwrap();
        let scratch = workspace.scratch_space().track_dir(3).unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.starts_with(workspace.path()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("0003-"));

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_scratch_survives_finish() {
        let root = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(Some(root.path())).unwrap();

        let scratch = workspace.scratch_space().track_dir(1).unwrap();
        let file = scratch.path().join("converted.mp3");
        std::fs::write(&file, b"untagged").unwrap();
        let kept = scratch.keep();

        let run_dir = workspace.finish().unwrap();
        assert!(run_dir.is_some());
        assert!(kept.exists());
        assert_eq!(std::fs::read(&file).unwrap(), b"untagged");
    }

    #[test]
    fn test_scratch_dirs_are_distinct() {
        let workspace = RunWorkspace::create(None).unwrap();
        let space = workspace.scratch_space();
        let a = space.track_dir(0).unwrap();
        let b = space.track_dir(0).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
