//! Breadth-first expansion of file and directory arguments.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for directory walking
#[derive(Debug)]
pub enum WalkError {
    ReadDir { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::ReadDir { path, source } => {
                write!(f, "Failed to list directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkError::ReadDir { source, .. } => Some(source),
        }
    }
}

/// A file found by the walker: containing directory plus base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Directory part of the path, empty for bare file names
    pub dir: String,
    pub name: String,
}

impl FileEntry {
    /// Split a path into directory and base name.
    pub fn from_path(path: &Path) -> Self {
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { dir, name }
    }

    /// Rejoin directory and name.
    pub fn path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.name)
    }
}

/// Iterator over every file reachable from a set of paths.
///
/// Directories are expanded one level at a time (breadth first) with their
/// children sorted by name. Anything that is not a directory is yielded
/// as-is, including paths that do not exist.
///
/// # Example
/// ```no_run
/// use multirename::walker::BatchWalker;
///
/// for entry in BatchWalker::new(["scans", "extra.pdf"]) {
///     let entry = entry?;
///     println!("{} / {}", entry.dir, entry.name);
/// }
/// # Ok::<(), multirename::walker::WalkError>(())
/// ```
#[derive(Debug)]
pub struct BatchWalker {
    queue: VecDeque<PathBuf>,
}

impl BatchWalker {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: paths.into_iter().map(Into::into).collect(),
        }
    }

    fn expand(&mut self, dir: &Path) -> Result<(), WalkError> {
        let read_err = |source| WalkError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut children = fs::read_dir(dir)
            .map_err(read_err)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;
        children.sort();

        self.queue.extend(children);
        Ok(())
    }
}

impl Iterator for BatchWalker {
    type Item = Result<FileEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.queue.pop_front() {
            if path.is_dir() {
                if let Err(e) = self.expand(&path) {
                    return Some(Err(e));
                }
                continue;
            }
            return Some(Ok(FileEntry::from_path(&path)));
        }
        None
    }
}
