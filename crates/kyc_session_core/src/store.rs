//! crates/kyc_session_core/src/store.rs
//!
//! The typed Token Store layered over a `SessionStore` port. Reads never fail
//! from the caller's point of view: storage problems are logged and reported
//! as an absent value.

use std::sync::Arc;

use tracing::{error, warn};

use crate::domain::AdminProfile;
use crate::ports::{PortError, PortResult, SessionKey, SessionStore};

#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn SessionStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn SessionStore>) -> Self {
        Self { backend }
    }

    pub fn get_token(&self) -> Option<String> {
        match self.backend.load(SessionKey::Token) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                error!("Failed to read token: {:?}", e);
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> PortResult<()> {
        self.backend.save(SessionKey::Token, token)
    }

    /// Returns the stored profile, or `None` if it is missing or unparseable.
    pub fn get_admin(&self) -> Option<AdminProfile> {
        let raw = match self.backend.load(SessionKey::Admin) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read admin profile: {:?}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(admin) => Some(admin),
            Err(e) => {
                warn!("Error parsing admin data: {}", e);
                None
            }
        }
    }

    pub fn set_admin(&self, admin: &AdminProfile) -> PortResult<()> {
        let raw = serde_json::to_string(admin)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.backend.save(SessionKey::Admin, &raw)
    }

    /// Clears both the token and the admin profile.
    pub fn remove_token(&self) {
        if let Err(e) = self.backend.clear_all() {
            error!("Failed to clear stored session: {:?}", e);
        }
    }
}
