//! services/admin_client/src/adapters/memory_store.rs
//!
//! An ephemeral `SessionStore` for tests and one-shot runs.

use kyc_session_core::ports::{PortError, PortResult, SessionKey, SessionStore};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<SessionKey, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<SessionKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| PortError::Storage("session map lock poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: SessionKey) -> PortResult<Option<String>> {
        Ok(self.entries()?.get(&key).cloned())
    }

    fn save(&self, key: SessionKey, value: &str) -> PortResult<()> {
        self.entries()?.insert(key, value.to_string());
        Ok(())
    }

    fn clear(&self, key: SessionKey) -> PortResult<()> {
        self.entries()?.remove(&key);
        Ok(())
    }

    fn clear_all(&self) -> PortResult<()> {
        self.entries()?.clear();
        Ok(())
    }
}
