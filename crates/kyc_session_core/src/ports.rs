//! crates/kyc_session_core/src/ports.rs
//!
//! Defines the service contracts (traits) the session logic depends on.
//! Storage, the remote admin API, user notifications and wall-clock time all
//! sit behind these traits so the core never touches a filesystem or socket.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{IssuedSession, LoginCredentials, SignupRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Session Storage
//=========================================================================================

/// The two durable keys a session occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    Admin,
}

impl SessionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Token => "token",
            SessionKey::Admin => "admin",
        }
    }
}

/// Durable key/value storage for one active session.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: SessionKey) -> PortResult<Option<String>>;

    fn save(&self, key: SessionKey, value: &str) -> PortResult<()>;

    fn clear(&self, key: SessionKey) -> PortResult<()>;

    /// Removes both keys. Adapters that can do this in one write should
    /// override it; after a successful return neither key is present.
    fn clear_all(&self) -> PortResult<()> {
        let token = self.clear(SessionKey::Token);
        let admin = self.clear(SessionKey::Admin);
        token.and(admin)
    }
}

//=========================================================================================
// Remote Admin API
//=========================================================================================

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchanges credentials for a bearer token and admin profile.
    async fn login(&self, credentials: &LoginCredentials) -> PortResult<IssuedSession>;

    /// Creates a new admin account. Does not log in.
    async fn signup(&self, request: &SignupRequest) -> PortResult<()>;

    /// Tells the backend the token is no longer in use.
    async fn logout(&self, token: &str) -> PortResult<()>;

    /// Asks the backend whether it still honours `token`.
    async fn validate_token(&self, token: &str) -> PortResult<bool>;
}

//=========================================================================================
// Notifications and Time
//=========================================================================================

/// User-facing toast-style notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
