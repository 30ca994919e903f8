//! Package descriptor providers.
//!
//! The resolver never reads files itself. Callers hand it a reader, either
//! synchronous ([`PackageReader`]) or asynchronous ([`AsyncPackageReader`]).
//! Both are implemented for closures.

use super::package_json::{read_package_json, PackageJson};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use url::Url;

/// Supplies descriptors on demand, blocking.
pub trait PackageReader {
    /// The descriptor at `url`, or `None` if there is none.
    fn read_package(&mut self, url: &Url) -> Option<PackageJson>;
}

impl<F> PackageReader for F
where
    F: FnMut(&Url) -> Option<PackageJson>,
{
    fn read_package(&mut self, url: &Url) -> Option<PackageJson> {
        self(url)
    }
}

/// Supplies descriptors on demand through a future.
pub trait AsyncPackageReader {
    /// The descriptor at `url`, or `None` if there is none.
    fn read_package(&mut self, url: Url) -> impl Future<Output = Option<PackageJson>>;
}

impl<F, Fut> AsyncPackageReader for F
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Option<PackageJson>>,
{
    fn read_package(&mut self, url: Url) -> impl Future<Output = Option<PackageJson>> {
        self(url)
    }
}

/// File stamp for cache invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageJsonStamp {
    /// Modification time in milliseconds since epoch.
    pub mtime_ms: Option<u64>,
    /// File size in bytes.
    pub size: Option<u64>,
}

impl PackageJsonStamp {
    /// Stamp a file by reading its metadata.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.metadata() {
            Ok(meta) => Self {
                mtime_ms: mtime_ms(&meta),
                size: Some(meta.len()),
            },
            Err(_) => Self::default(),
        }
    }

    /// Whether the file still looks the way it did when stamped.
    ///
    /// Missing files never match.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(meta) = path.metadata() else {
            return false;
        };

        if self.mtime_ms.is_some() && mtime_ms(&meta) != self.mtime_ms {
            return false;
        }

        self.size.map_or(true, |size| meta.len() == size)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn mtime_ms(meta: &std::fs::Metadata) -> Option<u64> {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
}

#[derive(Debug)]
struct CachedPackageJson {
    pkg: Option<PackageJson>,
    stamp: PackageJsonStamp,
}

/// Reads `package.json` files for `file:` URLs.
///
/// Unreadable or malformed files read as absent. With a cache, parsed
/// descriptors are reused until the file's stamp changes.
#[derive(Debug, Default)]
pub struct FsPackageReader {
    cache: Option<RefCell<HashMap<PathBuf, CachedPackageJson>>>,
}

impl FsPackageReader {
    /// A reader that always goes to disk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader that caches parsed descriptors by path.
    #[must_use]
    pub fn cached() -> Self {
        Self {
            cache: Some(RefCell::new(HashMap::new())),
        }
    }

    /// Read the descriptor at `url`. Non-`file:` URLs read as absent.
    pub fn read(&self, url: &Url) -> Option<PackageJson> {
        if url.scheme() != "file" {
            return None;
        }
        let path = url.to_file_path().ok()?;

        let Some(cache) = &self.cache else {
            return read_package_json(&path);
        };

        if let Some(entry) = cache.borrow().get(&path) {
            if entry.stamp.matches(&path) {
                return entry.pkg.clone();
            }
        }

        let stamp = PackageJsonStamp::from_path(&path);
        let pkg = read_package_json(&path);
        cache.borrow_mut().insert(
            path,
            CachedPackageJson {
                pkg: pkg.clone(),
                stamp,
            },
        );
        pkg
    }

    /// Number of cached entries.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.borrow().len())
    }
}

impl PackageReader for FsPackageReader {
    fn read_package(&mut self, url: &Url) -> Option<PackageJson> {
        self.read(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stamp_from_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "d"}"#).unwrap();

        let stamp = PackageJsonStamp::from_path(&file);
        assert!(stamp.mtime_ms.is_some());
        assert_eq!(stamp.size, Some(13));
        assert!(stamp.matches(&file));
    }

    #[test]
    fn test_stamp_mismatch_after_write() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "d"}"#).unwrap();

        let stamp = PackageJsonStamp::from_path(&file);
        fs::write(&file, r#"{"name": "renamed"}"#).unwrap();

        // Size changed.
        assert!(!stamp.matches(&file));
    }

    #[test]
    fn test_stamp_missing_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("missing.json");

        let stamp = PackageJsonStamp::from_path(&file);
        assert_eq!(stamp, PackageJsonStamp::default());
        assert!(!stamp.matches(&file));
    }

    #[test]
    fn test_fs_reader() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "d"}"#).unwrap();

        let reader = FsPackageReader::new();
        let url = Url::from_file_path(dir.path().join("package.json")).unwrap();
        assert_eq!(reader.read(&url).unwrap().name.as_deref(), Some("d"));

        let missing = Url::from_file_path(dir.path().join("e/package.json")).unwrap();
        assert!(reader.read(&missing).is_none());

        let remote = Url::parse("https://example.com/package.json").unwrap();
        assert!(reader.read(&remote).is_none());
        assert_eq!(reader.cached_len(), 0);
    }

    #[test]
    fn test_fs_reader_cache_invalidation() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "d"}"#).unwrap();

        let reader = FsPackageReader::cached();
        let url = Url::from_file_path(&file).unwrap();

        assert_eq!(reader.read(&url).unwrap().name.as_deref(), Some("d"));
        assert_eq!(reader.cached_len(), 1);
        assert_eq!(reader.read(&url).unwrap().name.as_deref(), Some("d"));

        fs::write(&file, r#"{"name": "renamed"}"#).unwrap();
        assert_eq!(reader.read(&url).unwrap().name.as_deref(), Some("renamed"));
        assert_eq!(reader.cached_len(), 1);
    }

    #[test]
    fn test_closure_reader() {
        let mut calls = 0;
        let mut reader = |_url: &Url| -> Option<PackageJson> {
            calls += 1;
            None
        };
        let url = Url::parse("file:///a/package.json").unwrap();
        assert!(PackageReader::read_package(&mut reader, &url).is_none());
        assert_eq!(calls, 1);
    }
}
