//! Filesystem storage for cached search results.
//!
//! Layout under the cache root:
//!
//! ```text
//! manifest.json                       index of every record
//! search_20250101100000000.json       one SearchResult per file
//! search_20250101100000000-001.json   same millisecond, saved later
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use nexus_core::Result;
use nexus_core::error::{CacheError, Error};
use nexus_core::search::SearchResult;

const MANIFEST_FILE: &str = "manifest.json";
const RECORD_PREFIX: &str = "search_";
const RECORD_EXTENSION: &str = "json";

fn map_io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| {
        Error::Cache(CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Write a freshly created record, removing it again if the write fails so
/// no half-written record is left behind.
fn fill_record(
    path: &Path,
    json: &[u8],
    write: impl FnOnce(&[u8]) -> io::Result<()>,
) -> Result<()> {
    if let Err(e) = write(json) {
        if let Err(remove) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove, "failed to remove incomplete cache record");
        }
        return Err(map_io(path)(e));
    }
    Ok(())
}

/// One record listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Record identifier (the file stem).
    pub id: String,
    /// Timestamp of the cached search.
    pub timestamp: DateTime<Utc>,
    /// Number of assets in the record.
    pub asset_count: usize,
}

impl CacheEntry {
    fn newer_than(&self, other: &CacheEntry) -> bool {
        (self.timestamp, &self.id) > (other.timestamp, &other.id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    records: Vec<CacheEntry>,
}

/// Persists search results and finds the latest one.
///
/// The cache is empty until the first [`save`](Self::save); after that
/// [`load_latest`](Self::load_latest) always has a record to return.
/// Records are never overwritten and never pruned implicitly.
#[derive(Debug, Clone)]
pub struct SearchCache {
    root: PathBuf,
}

impl SearchCache {
    /// Create a cache stored under `root`. Nothing is touched on disk
    /// until the first save.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Get the path of a record file.
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    fn record_id(timestamp: &DateTime<Utc>, attempt: u32) -> String {
        let base = format!("{}{}", RECORD_PREFIX, timestamp.format("%Y%m%d%H%M%S%3f"));
        if attempt == 0 {
            base
        } else {
            format!("{}-{:03}", base, attempt)
        }
    }

    /// Persist a search result as a new record and return its identifier.
    #[instrument(skip(self, result), fields(assets = result.assets.len()))]
    pub fn save(&self, result: &SearchResult) -> Result<String> {
        fs::create_dir_all(&self.root).map_err(map_io(&self.root))?;

        let json = serde_json::to_vec_pretty(result).map_err(|e| CacheError::Corrupt {
            path: self.root.clone(),
            reason: e.to_string(),
        })?;

        let (id, path, mut file) = self.create_record_file(&result.timestamp)?;
        fill_record(&path, &json, |json| {
            file.write_all(json)?;
            file.sync_all()
        })?;

        let mut records = self.records()?;
        if !records.iter().any(|entry| entry.id == id) {
            records.push(CacheEntry {
                id: id.clone(),
                timestamp: result.timestamp,
                asset_count: result.assets.len(),
            });
        }
        self.write_manifest(records)?;

        debug!(%id, path = %path.display(), "saved search result");
        Ok(id)
    }

    /// Create a fresh record file, never reusing an existing name.
    fn create_record_file(&self, timestamp: &DateTime<Utc>) -> Result<(String, PathBuf, fs::File)> {
        for attempt in 0..1000 {
            let id = Self::record_id(timestamp, attempt);
            let path = self.record_path(&id);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((id, path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(map_io(&path)(e)),
            }
        }

        Err(map_io(&self.root)(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "too many records share one timestamp",
        )))
    }

    /// Load the record with the greatest timestamp.
    ///
    /// Ties on timestamp go to the lexicographically greatest identifier.
    #[instrument(skip(self))]
    pub fn load_latest(&self) -> Result<SearchResult> {
        let latest = self
            .records()?
            .into_iter()
            .reduce(|best, entry| if entry.newer_than(&best) { entry } else { best })
            .ok_or(CacheError::Empty)?;

        debug!(id = %latest.id, "loading latest search result");
        self.load(&latest.id)
    }

    /// Load a record by identifier.
    pub fn load(&self, id: &str) -> Result<SearchResult> {
        let path = self.record_path(id);

        let json = match fs::read(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound { id: id.to_string() }.into());
            }
            Err(e) => return Err(map_io(&path)(e)),
        };

        serde_json::from_slice(&json).map_err(|e| {
            CacheError::Corrupt {
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// List every record, oldest first.
    ///
    /// Reads the manifest; when it is missing or unreadable the records
    /// are recovered by scanning the directory.
    pub fn records(&self) -> Result<Vec<CacheEntry>> {
        let mut records = match self.read_manifest()? {
            Some(manifest) => manifest
                .records
                .into_iter()
                .filter(|entry| self.record_path(&entry.id).is_file())
                .collect(),
            None => self.scan()?,
        };

        records.sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));
        Ok(records)
    }

    /// Returns true if no search has been cached.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.records()?.is_empty())
    }

    /// Returns true if `result` was captured on a different calendar day
    /// than `reference`. Cached results are a fresh view of the repository
    /// only for the rest of the day they were taken.
    pub fn is_stale<Tz: TimeZone>(result: &SearchResult, reference: &DateTime<Tz>) -> bool {
        result.is_stale(reference)
    }

    /// Delete the oldest records so that at most `keep` remain.
    ///
    /// Returns how many records were removed.
    #[instrument(skip(self))]
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let records = self.records()?;
        if records.len() <= keep {
            return Ok(0);
        }

        let excess = records.len() - keep;
        let (removed, kept) = records.split_at(excess);

        for entry in removed {
            let path = self.record_path(&entry.id);
            match fs::remove_file(&path) {
                Ok(()) => debug!(id = %entry.id, "pruned search result"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(map_io(&path)(e)),
            }
        }

        self.write_manifest(kept.to_vec())?;
        Ok(excess)
    }

    fn read_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();

        let json = match fs::read(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(&path)(e)),
        };

        match serde_json::from_slice(&json) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable cache manifest");
                Ok(None)
            }
        }
    }

    /// Replace the manifest atomically.
    fn write_manifest(&self, records: Vec<CacheEntry>) -> Result<()> {
        let path = self.manifest_path();
        let tmp = self
            .root
            .join(format!(".manifest-{}.tmp", Uuid::new_v4().simple()));

        let json = serde_json::to_vec_pretty(&Manifest { records }).map_err(|e| {
            CacheError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        fs::write(&tmp, json).map_err(map_io(&tmp))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(map_io(&path)(e));
        }
        Ok(())
    }

    /// Rebuild the record list from the files on disk.
    fn scan(&self) -> Result<Vec<CacheEntry>> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(&self.root)(e)),
        };

        let mut records = Vec::new();
        for entry in dir {
            let entry = entry.map_err(map_io(&self.root))?;
            let path = entry.path();

            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.starts_with(RECORD_PREFIX));
            if !is_record {
                continue;
            }

            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            match self.load(&id) {
                Ok(result) => records.push(CacheEntry {
                    id,
                    timestamp: result.timestamp,
                    asset_count: result.assets.len(),
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable cache record"),
            }
        }

        debug!(count = records.len(), "rebuilt cache index from directory");
        Ok(records)
    }
}
