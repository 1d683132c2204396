use std::collections::HashMap;

use crate::errors::JournalError;

/// Trait abstraction over a string key-value store (browser local storage,
/// a directory of files, an in-process map).
///
/// Writes are whole-value: a successful `set` replaces the previous value
/// completely, a failed one leaves it untouched.
pub trait KeyValueBackend {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, JournalError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), JournalError>;

    fn remove(&mut self, key: &str) -> Result<(), JournalError>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Result<Option<String>, JournalError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), JournalError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), JournalError> {
        (**self).remove(key)
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryBackend
// ═══════════════════════════════════════════════════════════════════

/// In-process map, optionally capped like browser storage quotas.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
    /// Max total bytes across all keys and values
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes pushing total size past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Change or lift the quota after construction.
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Seed a raw value, bypassing the quota.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Total bytes currently stored.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.values.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, JournalError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), JournalError> {
        if let Some(quota) = self.quota {
            let existing = self.values.get(key).map_or(0, |v| key.len() + v.len());
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > quota {
                return Err(JournalError::QuotaExceeded { needed, quota });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), JournalError> {
        self.values.remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════
// FileBackend (native only)
// ═══════════════════════════════════════════════════════════════════

/// One file per key under a data directory.
///
/// Values are written to a sibling temp file and renamed into place, so a
/// reader sees either the old or the new value, never a torn write.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileBackend {
    /// Use `dir` as the storage root, creating it if needed.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Result<Self, JournalError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Path holding the value for `key`.
    pub fn path_for(&self, key: &str) -> Result<std::path::PathBuf, JournalError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            || key.starts_with('.')
        {
            return Err(JournalError::Storage(format!(
                "Invalid storage key '{key}': use letters, digits, '.', '_' or '-'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, JournalError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), JournalError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), JournalError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
