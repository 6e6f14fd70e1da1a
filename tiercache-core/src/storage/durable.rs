use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{StorageBackend, StorageKind, DEFAULT_QUOTA_BYTES};
use crate::error::StoreError;

const RECORD_EXT: &str = "rec";
const TEMP_EXT: &str = "tmp";

/// Longest hex run used as one path component, well under the usual
/// 255-byte file name limit once the extension is added.
const SEGMENT_LEN: usize = 200;

/// Directory-backed store that survives restarts.
///
/// Each key is one file named after the hex encoding of the key. A hex name
/// longer than 200 chars is split into 200-char directory levels, with the
/// remainder as the file name, so keys of any length fit. Writes go to a
/// temporary file that is then renamed over the record, so a reader sees
/// either the previous value or the new one, never a partial write.
///
/// # Examples
///
/// ```no_run
/// use tiercache_core::{DurableStore, StorageBackend};
///
/// let store = DurableStore::new("/var/cache/myapp", 1024 * 1024);
/// store.probe()?;
/// store.put("ns:key", b"bytes")?;
/// # Ok::<(), tiercache_core::StoreError>(())
/// ```
#[derive(Debug)]
pub struct DurableStore {
    dir: PathBuf,
    quota: usize,
    write_lock: Mutex<()>,
}

impl DurableStore {
    pub fn new(dir: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            quota: quota_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_default_quota(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_QUOTA_BYTES)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = hex::encode(key.as_bytes());
        let mut path = self.dir.clone();
        let mut rest = name.as_str();
        while rest.len() > SEGMENT_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_LEN);
            path.push(segment);
            rest = tail;
        }
        path.push(format!("{}.{}", rest, RECORD_EXT));
        path
    }

    /// Lists `(key, value size)` for every record under the directory.
    fn records(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut records = Vec::new();
        collect_records(&self.dir, "", &mut records)?;
        Ok(records)
    }

    /// Removes the empty segment directories left above `path`.
    fn prune_segments(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.dir || fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

/// Walks `dir`, prefixing file stems with the hex of the segment levels
/// above them.
fn collect_records(
    dir: &Path,
    prefix: &str,
    records: &mut Vec<(String, usize)>,
) -> Result<(), StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for item in entries {
        let item = item?;
        let path = item.path();

        if item.file_type()?.is_dir() {
            if let Some(segment) = path
                .file_name()
                .and_then(|s| s.to_str())
                .filter(|s| s.len() == SEGMENT_LEN)
            {
                collect_records(&path, &format!("{}{}", prefix, segment), records)?;
            }
            continue;
        }

        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
            continue;
        }
        let Some(key) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| hex::decode(format!("{}{}", prefix, s)).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok())
        else {
            continue;
        };
        let size = item.metadata()?.len() as usize;
        records.push((key, size));
    }
    Ok(())
}

impl StorageBackend for DurableStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Durable
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        fs::create_dir_all(&self.dir)?;

        let mut used = 0usize;
        let mut existing = 0usize;
        for (k, size) in self.records()? {
            used += k.len() + size;
            if k == key {
                existing = k.len() + size;
            }
        }
        let incoming = key.len() + value.len();
        if used - existing + incoming > self.quota {
            return Err(StoreError::QuotaExceeded {
                requested: incoming,
                quota: self.quota,
            });
        }

        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension(TEMP_EXT);
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                self.prune_segments(&path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records()?.into_iter().map(|(k, _)| k).collect())
    }
}
