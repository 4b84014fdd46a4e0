//! Mission dataset repository applying a [`LoadStrategy`].

use lifeflight_domain::MissionRecord;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use super::LoadStrategy;
use crate::error::{DataError, Result};
use crate::missions::{MissionCsvLoader, MissionSource};

/// What a dataset file looked like when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => DataError::NotFound {
                artifact: "Data file",
                path: path.to_path_buf(),
            },
            _ => DataError::Io(err),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct CachedDataset {
    identity: FileIdentity,
    records: Arc<[MissionRecord]>,
}

/// Mission source over a CSV export with an optional load-once cache.
///
/// The cache is filled at most once. When the file changes on disk later,
/// requests are served from fresh loads and the cached copy is left alone.
#[derive(Debug)]
pub struct MissionRepository {
    loader: MissionCsvLoader,
    strategy: LoadStrategy,
    cache: OnceLock<CachedDataset>,
}

impl MissionRepository {
    #[must_use]
    pub fn new(loader: MissionCsvLoader, strategy: LoadStrategy) -> Self {
        Self {
            loader,
            strategy,
            cache: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    fn cached(&self, identity: &FileIdentity) -> Option<Arc<[MissionRecord]>> {
        let cached = self.cache.get()?;
        if cached.identity == *identity {
            return Some(Arc::clone(&cached.records));
        }
        tracing::warn!(
            path = %identity.path.display(),
            cached_len = cached.identity.len,
            current_len = identity.len,
            "Dataset changed on disk since it was cached, serving a fresh load"
        );
        None
    }
}

impl MissionSource for MissionRepository {
    fn load(&self) -> Result<Arc<[MissionRecord]>> {
        if self.strategy == LoadStrategy::Reload {
            return self.strategy.read(|| None, || MissionSource::load(&self.loader), |_| {});
        }

        let identity = FileIdentity::of(self.loader.path())?;
        self.strategy.read(
            || self.cached(&identity),
            || MissionSource::load(&self.loader),
            |records| {
                let _ = self.cache.set(CachedDataset {
                    identity: identity.clone(),
                    records: Arc::clone(records),
                });
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EXPORT: &str = "tdate,disptime,enrtime\n2023-01-02,10:00,10:12\n";

    fn write_export(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("data.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_cache_first_reuses_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), EXPORT);
        let repo = MissionRepository::new(MissionCsvLoader::new(&path), LoadStrategy::CacheFirst);

        let a = repo.load().unwrap();
        let b = repo.load().unwrap();
        assert_eq!(a.len(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_reload_reads_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), EXPORT);
        let repo = MissionRepository::new(MissionCsvLoader::new(&path), LoadStrategy::Reload);

        let a = repo.load().unwrap();
        let b = repo.load().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_changed_file_served_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), EXPORT);
        let repo = MissionRepository::new(MissionCsvLoader::new(&path), LoadStrategy::CacheFirst);
        let first = repo.load().unwrap();

        write_export(
            dir.path(),
            "tdate,disptime,enrtime\n2023-01-02,10:00,10:12\n2023-01-03,11:00,11:20\n",
        );
        let second = repo.load().unwrap();
        assert_eq!(second.len(), 2);

        // The original copy stays cached.
        assert_eq!(repo.cache.get().map(|c| c.records.len()), Some(first.len()));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = MissionRepository::new(
            MissionCsvLoader::new(dir.path().join("data.csv")),
            LoadStrategy::CacheFirst,
        );
        assert!(repo.load().unwrap_err().is_not_found());
    }
}
