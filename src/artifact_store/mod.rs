//! Artifact directory access.
//!
//! The directory itself is the index: an artifact belongs to the attempt
//! whose id prefixes its filename. Files are found by prefix scan and evicted
//! by age, with no other bookkeeping.

use crate::converter::naming::{self, ArtifactId};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// A stored artifact resolved from its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    /// Name on disk, including the id prefix.
    pub filename: String,
    /// Name offered to downloaders, without the id prefix.
    pub display_name: String,
}

/// Counters of one sweep over the artifact directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub errors: usize,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    ttl: Duration,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolves a caller supplied id to its artifact.
    ///
    /// Strings that are not well formed ids never match anything.
    pub fn locate(&self, id: &str) -> io::Result<Option<StoredArtifact>> {
        let Some(id) = ArtifactId::parse(id) else {
            return Ok(None);
        };
        let Some(path) = find_artifact(&self.dir, &id)? else {
            return Ok(None);
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display_name = naming::display_name(&filename, &id).to_string();
        Ok(Some(StoredArtifact {
            path,
            filename,
            display_name,
        }))
    }

    /// Deletes every artifact older than the TTL.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now(), |path| std::fs::remove_file(path))
    }

    /// Sweep against an explicit clock and removal function.
    ///
    /// An artifact is deleted only when strictly older than the TTL; files
    /// with a modification time in the future are kept. Failures on single
    /// entries are logged and counted, never fatal.
    pub fn sweep_at<F>(&self, now: SystemTime, mut remove: F) -> SweepReport
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let mut report = SweepReport::default();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Artifact directory does not exist: {:?}", self.dir);
                return report;
            }
            Err(e) => {
                warn!("Failed to read artifact directory {:?}: {}", self.dir, e);
                report.errors += 1;
                return report;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    report.errors += 1;
                    continue;
                }
            };

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to get metadata for {:?}: {}", path, e);
                    report.errors += 1;
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            report.scanned += 1;

            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to get modified time for {:?}: {}", path, e);
                    report.errors += 1;
                    continue;
                }
            };

            // Modified time in the future: not expired
            let Ok(age) = now.duration_since(modified) else {
                continue;
            };
            if age <= self.ttl {
                continue;
            }

            match remove(&path) {
                Ok(()) => {
                    debug!("Deleted expired artifact {:?} (age: {}s)", path, age.as_secs());
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!("Failed to delete {:?}: {}", path, e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Artifact sweep complete: scanned={}, deleted={}, errors={}",
            report.scanned, report.deleted, report.errors
        );
        report
    }
}

/// First regular file in `dir`, by name, carrying the prefix of `id`.
///
/// A missing directory holds no artifacts.
pub fn find_artifact(dir: &Path, id: &ArtifactId) -> io::Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let prefix = id.file_prefix();
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if is_match && entry.file_type()?.is_file() {
            matches.push(entry.path());
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(24 * 60 * 60);

    fn write(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"audio").unwrap();
        path
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn locate_round_trips_display_name() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let id = ArtifactId::generate();
        let path = write(dir.path(), &format!("{}_Aitana - En El Coche.mp3", id));

        let artifact = store.locate(&id.to_string()).unwrap().unwrap();

        assert_eq!(artifact.path, path);
        assert_eq!(artifact.filename, format!("{}_Aitana - En El Coche.mp3", id));
        assert_eq!(artifact.display_name, "Aitana - En El Coche.mp3");
    }

    #[test]
    fn locate_ignores_other_ids_and_garbage() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let id = ArtifactId::generate();
        write(dir.path(), &format!("{}_Song.mp3", ArtifactId::generate()));
        write(dir.path(), "unrelated.mp3");

        assert_eq!(store.locate(&id.to_string()).unwrap(), None);
        assert_eq!(store.locate("").unwrap(), None);
        assert_eq!(store.locate("unrelated").unwrap(), None);
        assert_eq!(store.locate("../etc/passwd").unwrap(), None);
    }

    #[test]
    fn locate_skips_directories_and_picks_first_by_name() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let id = ArtifactId::generate();
        fs::create_dir(dir.path().join(format!("{}_A dir", id))).unwrap();
        write(dir.path(), &format!("{}_b.mp3", id));
        write(dir.path(), &format!("{}_c.mp3", id));

        let artifact = store.locate(&id.to_string()).unwrap().unwrap();

        assert_eq!(artifact.display_name, "b.mp3");
    }

    #[test]
    fn locate_in_missing_directory_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing"), TTL);
        let id = ArtifactId::generate();

        assert_eq!(store.locate(&id.to_string()).unwrap(), None);
        assert_eq!(find_artifact(store.dir(), &id).unwrap(), None);
    }

    #[test]
    fn sweep_deletes_only_strictly_older_than_ttl() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let path = write(dir.path(), "artifact.mp3");
        let modified = mtime(&path);

        let report = store.sweep_at(modified + TTL - Duration::from_secs(1), |p| {
            fs::remove_file(p)
        });
        assert_eq!(report.deleted, 0);
        assert!(path.exists());

        let report = store.sweep_at(modified + TTL, |p| fs::remove_file(p));
        assert_eq!(report.deleted, 0);
        assert!(path.exists());

        let report = store.sweep_at(modified + TTL + Duration::from_secs(1), |p| {
            fs::remove_file(p)
        });
        assert_eq!(
            report,
            SweepReport {
                scanned: 1,
                deleted: 1,
                errors: 0
            }
        );
        assert!(!path.exists());
    }

    #[test]
    fn sweep_keeps_files_from_the_future() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);
        let path = write(dir.path(), "artifact.mp3");

        let report = store.sweep_at(mtime(&path) - Duration::from_secs(60), |p| {
            fs::remove_file(p)
        });

        assert_eq!(report.deleted, 0);
        assert!(path.exists());
    }

    #[test]
    fn failing_delete_does_not_stop_the_sweep() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let paths: Vec<PathBuf> = ["a.mp3", "b.mp3", "c.mp3"]
            .iter()
            .map(|name| write(dir.path(), name))
            .collect();
        let latest = paths.iter().map(|p| mtime(p)).max().unwrap();

        let report = store.sweep_at(latest + TTL * 2, |p| {
            if p.ends_with("b.mp3") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(p)
            }
        });

        assert_eq!(
            report,
            SweepReport {
                scanned: 3,
                deleted: 2,
                errors: 1
            }
        );
        assert!(!paths[0].exists());
        assert!(paths[1].exists());
        assert!(!paths[2].exists());
    }

    #[test]
    fn sweep_skips_directories() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();

        let report = store.sweep_at(SystemTime::now() + TTL, |p| fs::remove_file(p));

        assert_eq!(report, SweepReport::default());
        assert!(sub.exists());
    }

    #[test]
    fn sweep_of_missing_directory_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing"), TTL);

        assert_eq!(store.sweep(), SweepReport::default());
    }

    #[test]
    fn sweep_with_real_clock_keeps_fresh_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), TTL);
        let path = write(dir.path(), "fresh.mp3");

        let report = store.sweep();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.deleted, 0);
        assert!(path.exists());
    }
}
