use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// What a sweep did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub deleted: Vec<PathBuf>,
    pub kept: usize,
    /// Files that were stale but could not be removed
    pub failed: Vec<PathBuf>,
}

/// Delete regular files in `dir` last modified more than `max_age` ago
pub fn sweep_stale_files(dir: &Path, max_age: Duration) -> Result<SweepReport> {
    sweep_stale_files_at(dir, max_age, OffsetDateTime::now_utc())
}

/// Same as [`sweep_stale_files`] with an explicit clock.
///
/// A missing directory is an empty sweep, so running twice is harmless.
pub fn sweep_stale_files_at(
    dir: &Path,
    max_age: Duration,
    now: OffsetDateTime,
) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    if !dir.is_dir() {
        debug!("Sweep target {} does not exist", dir.display());
        return Ok(report);
    }

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let modified = match file_modified(&path) {
            Ok(Some(modified)) => OffsetDateTime::from(modified),
            Ok(None) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} vanished during sweep", path.display());
                continue;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if now - modified <= max_age {
            report.kept += 1;
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed stale file {}", path.display());
                report.deleted.push(path);
            }
            // lost a race with another sweep
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
    }

    info!(
        "Swept {}: {} deleted, {} kept",
        dir.display(),
        report.deleted.len(),
        report.kept
    );
    Ok(report)
}

/// Modification time of a regular file, `None` for anything else.
///
/// Follows links; a file removed mid-sweep shows up as `NotFound`.
fn file_modified(path: &Path) -> std::io::Result<Option<SystemTime>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(None);
    }
    metadata.modified().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[test]
    fn fresh_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.svg"), "x").unwrap();
        let report = sweep_stale_files(dir.path(), DAY).unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn stale_files_go_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.svg"), "x").unwrap();
        fs::write(dir.path().join("b.dxf"), "y").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let later = OffsetDateTime::now_utc() + time::Duration::days(2);
        let first = sweep_stale_files_at(dir.path(), DAY, later).unwrap();
        assert_eq!(first.deleted.len(), 2);
        assert!(dir.path().join("nested").exists());

        let second = sweep_stale_files_at(dir.path(), DAY, later).unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(second.kept, 0);
    }

    #[test]
    fn missing_directory_is_empty_sweep() {
        let report = sweep_stale_files(Path::new("/nonexistent/sweep/dir"), DAY).unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[cfg(unix)]
    #[test]
    fn vanished_entry_does_not_stop_sweep() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.svg"), "x").unwrap();
        // dangling link: listed by read_dir, gone by the time it is inspected
        std::os::unix::fs::symlink(dir.path().join("gone.dxf"), dir.path().join("b.dxf"))
            .unwrap();

        let later = OffsetDateTime::now_utc() + time::Duration::days(2);
        let report = sweep_stale_files_at(dir.path(), DAY, later).unwrap();
        assert_eq!(report.deleted, vec![dir.path().join("a.svg")]);
        assert_eq!(report.kept, 0);
        assert!(report.failed.is_empty());
    }
}
