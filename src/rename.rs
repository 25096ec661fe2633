//! Collision-safe batch rename executor.
//!
//! Consumes a [`BatchPlan`] (directory → original name → proposed name or
//! `None`) and sorts every entry into exactly one of three buckets:
//! renamed, skipped, or failed. An existing file is never overwritten: a
//! `-1`, `-2`, ... suffix is added before the extension until the target
//! path is free.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory → original file name → proposed new name (`None` = leave as is)
pub type BatchPlan = IndexMap<String, IndexMap<String, Option<String>>>;

/// Metadata for one successfully renamed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub original_path: String,
    pub proposed_name: String,
    /// True when a collision suffix had to be added
    pub proposed_is_different: bool,
}

/// Outcome of processing one plan entry
#[derive(Debug)]
pub enum RenameOutcome {
    /// Renamed to the given final path
    Renamed(PathBuf, RenameRecord),
    Skipped,
    Failed(io::Error),
}

/// Result of a whole batch: three disjoint buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameReport {
    /// Final path → record
    pub renamed: IndexMap<String, RenameRecord>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl RenameReport {
    /// Number of plan entries accounted for.
    pub fn total(&self) -> usize {
        self.renamed.len() + self.skipped.len() + self.failed.len()
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            ":: Out of total of {}:: renamed: {}, skipped: {}, failed: {}",
            self.total(),
            self.renamed.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }

    /// Build a plan that renames every file of this report back to its
    /// original name.
    ///
    /// # Example
    /// ```
    /// use multirename::rename::{RenameRecord, RenameReport};
    ///
    /// let mut report = RenameReport::default();
    /// report.renamed.insert(
    ///     "scans/4-3.pdf".to_string(),
    ///     RenameRecord {
    ///         original_path: "scans/Vol IV No 3.pdf".to_string(),
    ///         proposed_name: "4-3.pdf".to_string(),
    ///         proposed_is_different: false,
    ///     },
    /// );
    ///
    /// let plan = report.restore_plan();
    /// assert_eq!(
    ///     plan["scans"]["4-3.pdf"].as_deref(),
    ///     Some("Vol IV No 3.pdf")
    /// );
    /// ```
    pub fn restore_plan(&self) -> BatchPlan {
        let mut plan = BatchPlan::new();
        for (final_path, record) in &self.renamed {
            let (dir, name) = split_path(final_path);
            let (_, original_name) = split_path(&record.original_path);
            plan.entry(dir)
                .or_default()
                .insert(name, Some(original_name));
        }
        plan
    }

    fn record(&mut self, original: &Path, outcome: RenameOutcome) {
        let original = original.to_string_lossy().into_owned();
        match outcome {
            RenameOutcome::Renamed(target, record) => {
                self.renamed
                    .insert(target.to_string_lossy().into_owned(), record);
            }
            RenameOutcome::Skipped => self.skipped.push(original),
            RenameOutcome::Failed(_) => self.failed.push(original),
        }
    }
}

fn split_path(path: &str) -> (String, String) {
    let path = Path::new(path);
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}

/// Split a file name into base and extension (extension keeps its dot).
///
/// Leading dots do not start an extension, so `.bashrc` has none.
///
/// # Example
/// ```
/// use multirename::rename::split_extension;
///
/// assert_eq!(split_extension("4-3.pdf"), ("4-3", ".pdf"));
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let file = &name[file_start..];

    let first_non_dot = match file.find(|c: char| c != '.') {
        Some(i) => i,
        None => return (name, ""),
    };
    match file.rfind('.') {
        Some(dot) if dot > first_non_dot => name.split_at(file_start + dot),
        _ => (name, ""),
    }
}

/// True if any directory entry exists at `path`, including dangling symlinks.
fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// First free path for `proposed` inside `dir`: the name itself, then
/// `base-1.ext`, `base-2.ext`, ...
pub fn next_free_path(dir: &Path, proposed: &str) -> PathBuf {
    let mut target = dir.join(proposed);
    if !is_taken(&target) {
        return target;
    }

    let (base, ext) = split_extension(proposed);
    let mut counter = 1u64;
    loop {
        target = dir.join(format!("{}-{}{}", base, counter, ext));
        if !is_taken(&target) {
            return target;
        }
        counter += 1;
    }
}

/// Rename one file, never overwriting an existing one.
///
/// # Returns
/// The path actually used
pub fn rename_file(original: &Path, proposed: &str) -> io::Result<PathBuf> {
    let dir = original.parent().unwrap_or_else(|| Path::new(""));
    let target = next_free_path(dir, proposed);
    fs::rename(original, &target)?;
    Ok(target)
}

/// Process one plan entry.
pub fn apply(original: &Path, proposed: Option<&str>) -> RenameOutcome {
    let proposed = match proposed {
        Some(p) => p,
        None => return RenameOutcome::Skipped,
    };

    match rename_file(original, proposed) {
        Ok(target) => {
            let final_name = target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("Renamed {} -> {}", original.display(), target.display());
            let record = RenameRecord {
                original_path: original.to_string_lossy().into_owned(),
                proposed_name: proposed.to_string(),
                proposed_is_different: final_name != proposed,
            };
            RenameOutcome::Renamed(target, record)
        }
        Err(e) => {
            warn!("Error renaming file {}: {}", original.display(), e);
            RenameOutcome::Failed(e)
        }
    }
}

/// Execute a whole plan sequentially.
///
/// Filesystem errors are recorded per file and never stop the batch.
pub fn rename_files(plan: &BatchPlan) -> RenameReport {
    let mut report = RenameReport::default();

    for (dir, mappings) in plan {
        for (name, proposed) in mappings {
            let original = Path::new(dir).join(name);
            let outcome = apply(&original, proposed.as_deref());
            report.record(&original, outcome);
        }
    }

    info!("{}", report.summary());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("name"), ("name", ""));
        assert_eq!(split_extension("name."), ("name", "."));
        assert_eq!(split_extension("..hidden"), ("..hidden", ""));
        assert_eq!(split_extension(".hidden.txt"), (".hidden", ".txt"));
        assert_eq!(split_extension("a.b/c"), ("a.b/c", ""));
    }

    #[test]
    fn test_next_free_path_picks_first_gap() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(&dir.join("4-3.pdf"));
        touch(&dir.join("4-3-1.pdf"));
        touch(&dir.join("4-3-3.pdf"));

        assert_eq!(next_free_path(dir, "4-3.pdf"), dir.join("4-3-2.pdf"));
        assert_eq!(next_free_path(dir, "free.pdf"), dir.join("free.pdf"));
    }

    #[test]
    fn test_collision_keeps_existing_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("4-3.pdf"), b"existing").unwrap();
        fs::write(dir.join("source.pdf"), b"new").unwrap();

        let outcome = apply(&dir.join("source.pdf"), Some("4-3.pdf"));

        match outcome {
            RenameOutcome::Renamed(target, record) => {
                assert_eq!(target, dir.join("4-3-1.pdf"));
                assert!(record.proposed_is_different);
                assert_eq!(record.proposed_name, "4-3.pdf");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(fs::read(dir.join("4-3.pdf")).unwrap(), b"existing");
        assert_eq!(fs::read(dir.join("4-3-1.pdf")).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_not_overwritten() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(&dir.join("src.pdf"));
        symlink(dir.join("nowhere"), dir.join("4-3.pdf")).unwrap();

        let outcome = apply(&dir.join("src.pdf"), Some("4-3.pdf"));

        match outcome {
            RenameOutcome::Renamed(target, _) => assert_eq!(target, dir.join("4-3-1.pdf")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let link = fs::symlink_metadata(dir.join("4-3.pdf")).unwrap();
        assert!(link.file_type().is_symlink());
        assert_eq!(fs::read_link(dir.join("4-3.pdf")).unwrap(), dir.join("nowhere"));
    }

    #[test]
    fn test_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let outcome = apply(&tmp.path().join("ghost.pdf"), Some("x.pdf"));
        assert!(matches!(outcome, RenameOutcome::Failed(e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_summary_line() {
        let report = RenameReport {
            renamed: IndexMap::new(),
            skipped: vec!["a".to_string(), "b".to_string()],
            failed: vec!["c".to_string()],
        };
        assert_eq!(
            report.summary(),
            ":: Out of total of 3:: renamed: 0, skipped: 2, failed: 1"
        );
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = RenameReport::default();
        report.renamed.insert(
            "d/new.pdf".to_string(),
            RenameRecord {
                original_path: "d/old.pdf".to_string(),
                proposed_name: "new.pdf".to_string(),
                proposed_is_different: false,
            },
        );
        report.skipped.push("d/skip.pdf".to_string());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "renamed": {
                    "d/new.pdf": {
                        "original_path": "d/old.pdf",
                        "proposed_name": "new.pdf",
                        "proposed_is_different": false
                    }
                },
                "skipped": ["d/skip.pdf"],
                "failed": []
            })
        );
    }
}
