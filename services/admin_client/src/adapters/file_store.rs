//! services/admin_client/src/adapters/file_store.rs
//!
//! A durable `SessionStore` backed by a small JSON file. The file holds the
//! same two keys a browser would keep in local storage, so a session survives
//! restarts of the CLI.

use kyc_session_core::ports::{PortError, PortResult, SessionKey, SessionStore};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed session store. Every mutation rewrites the whole file
/// through a uniquely named temporary sibling that is then persisted over it.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Creates a new `FileSessionStore`. The file is created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn read_entries(&self) -> PortResult<Entries> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Entries::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                PortError::Malformed(format!("{} is not a session file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(PortError::Storage(e.to_string())),
        }
    }

    fn write_entries(&self, entries: &Entries) -> PortResult<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(PortError::Storage(e.to_string())),
            };
        }

        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        atomic_write(&self.path, self.parent_dir(), &raw)
            .map_err(|e| PortError::Storage(format!("writing {}: {}", self.path.display(), e)))?;

        debug!("Session file written to {}", self.path.display());
        Ok(())
    }

    /// Read-modify-write under the lock. A file that no longer parses is
    /// replaced rather than left in the way of every later write.
    fn update<F>(&self, change: F) -> PortResult<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PortError::Storage("session file lock poisoned".to_string()))?;
        let mut entries = match self.read_entries() {
            Err(PortError::Malformed(reason)) => {
                warn!("Discarding unreadable session data: {}", reason);
                Entries::new()
            }
            other => other?,
        };
        change(&mut entries);
        self.write_entries(&entries)
    }
}

/// Writes `data` to a fresh temp file in `parent` and persists it over
/// `target`. The session holds a bearer token, so the file is owner-only.
fn atomic_write(target: &Path, parent: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(parent)?;
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
    }

    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

impl SessionStore for FileSessionStore {
    fn load(&self, key: SessionKey) -> PortResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PortError::Storage("session file lock poisoned".to_string()))?;
        Ok(self.read_entries()?.remove(key.as_str()))
    }

    fn save(&self, key: SessionKey, value: &str) -> PortResult<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn clear(&self, key: SessionKey) -> PortResult<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    /// Drops both keys in a single rewrite.
    fn clear_all(&self) -> PortResult<()> {
        self.update(|entries| {
            entries.remove(SessionKey::Token.as_str());
            entries.remove(SessionKey::Admin.as_str());
        })
    }
}
