//! One cache directory with a toml index beside the files.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::checksum::Checksum;

use super::{CacheError, CacheKey};

const INDEX_FILE: &str = "granary-cache.toml";
const LOCK_FILE: &str = ".lock";

/// Index record for one cached file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Original source name, kept for listings.
    pub name: String,
    /// File name under the tier root.
    pub file: String,
    pub size: u64,
    pub checksum: Checksum,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TierIndex {
    #[serde(default)]
    entries: BTreeMap<Uuid, CacheEntry>,
}

/// A single cache directory. Read-only tiers never mutate anything, not
/// even to drop a corrupt entry.
#[derive(Debug, Clone)]
pub struct Tier {
    root: PathBuf,
    writeable: bool,
}

impl Tier {
    pub fn open(root: impl Into<PathBuf>, writeable: bool) -> Result<Self, CacheError> {
        let root = root.into();
        if writeable {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root, writeable })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn writeable(&self) -> bool {
        self.writeable
    }

    /// Verified lookup. An entry whose file is missing or no longer
    /// matches its record is evicted (when writeable) and reported as a
    /// miss.
    pub fn get(&self, id: Uuid) -> Result<Option<PathBuf>, CacheError> {
        let index = self.load_index()?;
        let Some(entry) = index.entries.get(&id) else {
            return Ok(None);
        };
        let path = self.root.join(&entry.file);
        if verify(&path, entry)? {
            return Ok(Some(path));
        }
        tracing::warn!(id = %id, path = %path.display(), "cache entry failed verification");
        if self.writeable {
            self.evict(id)?;
        }
        Ok(None)
    }

    /// Copy a file into the cache, verifying it against `key` on the way.
    pub fn put_file(&self, key: &CacheKey, from: &Path) -> Result<PathBuf, CacheError> {
        let mut staged = self.stage()?;
        let mut source = File::open(from)?;
        std::io::copy(&mut source, staged.as_file_mut())?;
        self.commit(key, staged)
    }

    pub fn put_bytes(&self, key: &CacheKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let mut staged = self.stage()?;
        staged.write_all(bytes)?;
        self.commit(key, staged)
    }

    /// Open a staging file inside the tier, so committing it later is a
    /// same-filesystem rename.
    pub(crate) fn stage(&self) -> Result<tempfile::NamedTempFile, CacheError> {
        if !self.writeable {
            return Err(CacheError::NotWriteable);
        }
        Ok(tempfile::NamedTempFile::new_in(&self.root)?)
    }

    /// Verify a staged file against `key`, move it into place, and index
    /// it. Nothing becomes visible unless the bytes check out.
    pub(crate) fn commit(
        &self,
        key: &CacheKey,
        staged: tempfile::NamedTempFile,
    ) -> Result<PathBuf, CacheError> {
        if !self.writeable {
            return Err(CacheError::NotWriteable);
        }
        let size = staged.as_file().metadata()?.len();
        if size != key.size {
            return Err(CacheError::SizeMismatch {
                name: key.name.clone(),
                size,
                expected: key.size,
            });
        }
        let digest = sha256_file(staged.path())?;
        if !key.checksum.matches_sha256_hex(&digest) {
            return Err(CacheError::ChecksumMismatch {
                name: key.name.clone(),
                expected: key.checksum.digest().to_string(),
                actual: digest,
            });
        }

        let _lock = self.lock()?;
        let file = file_name(key);
        let path = self.root.join(&file);
        staged.persist(&path).map_err(|e| CacheError::Io(e.error))?;

        let mut index = self.load_index()?;
        index.entries.insert(
            key.id,
            CacheEntry {
                name: key.name.clone(),
                file,
                size: key.size,
                checksum: key.checksum.clone(),
            },
        );
        self.store_index(&index)?;
        tracing::debug!(id = %key.id, name = %key.name, root = %self.root.display(), "cached");
        Ok(path)
    }

    /// Drop one entry and its file. Returns whether anything was there.
    pub fn evict(&self, id: Uuid) -> Result<bool, CacheError> {
        if !self.writeable {
            return Err(CacheError::NotWriteable);
        }
        let _lock = self.lock()?;
        let mut index = self.load_index()?;
        let Some(entry) = index.entries.remove(&id) else {
            return Ok(false);
        };
        match fs::remove_file(self.root.join(&entry.file)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.store_index(&index)?;
        Ok(true)
    }

    /// Drop every entry. Returns how many there were.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.writeable {
            return Err(CacheError::NotWriteable);
        }
        let _lock = self.lock()?;
        let mut index = self.load_index()?;
        let count = index.entries.len();
        for entry in index.entries.values() {
            match fs::remove_file(self.root.join(&entry.file)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        index.entries.clear();
        self.store_index(&index)?;
        Ok(count)
    }

    pub fn entries(&self) -> Result<Vec<(Uuid, CacheEntry)>, CacheError> {
        Ok(self.load_index()?.entries.into_iter().collect())
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn load_index(&self) -> Result<TierIndex, CacheError> {
        let path = self.index_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TierIndex::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| CacheError::Index {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn store_index(&self, index: &TierIndex) -> Result<(), CacheError> {
        let text = toml::to_string_pretty(index).map_err(|e| CacheError::Index {
            path: self.index_path().display().to_string(),
            reason: e.to_string(),
        })?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.root)?;
        staged.write_all(text.as_bytes())?;
        staged
            .persist(self.index_path())
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn lock(&self) -> Result<TierLock, CacheError> {
        TierLock::acquire(&self.root.join(LOCK_FILE))
    }
}

/// Advisory file lock serializing tier mutations across processes.
/// Unlocks on drop.
struct TierLock {
    file: File,
}

impl TierLock {
    fn acquire(path: &Path) -> Result<Self, CacheError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for TierLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn file_name(key: &CacheKey) -> String {
    match Path::new(&key.name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", key.id, ext),
        None => key.id.to_string(),
    }
}

fn verify(path: &Path, entry: &CacheEntry) -> Result<bool, CacheError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if meta.len() != entry.size {
        return Ok(false);
    }
    let digest = sha256_file(path)?;
    Ok(entry.checksum.matches_sha256_hex(&digest))
}

fn sha256_file(path: &Path) -> Result<String, CacheError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
