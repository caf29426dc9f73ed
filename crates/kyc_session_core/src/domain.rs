//! crates/kyc_session_core/src/domain.rs
//!
//! Defines the core data structures shared by the session client.
//! The admin profile is mirrored verbatim from the backend, so it is the one
//! type here that carries serde derives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The admin record returned by the backend on login or signup.
///
/// Fields the client does not know about are kept in `extra` so that a
/// stored profile round-trips without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// A token/profile pair issued by a successful login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub admin: AdminProfile,
}

/// The result handed back to callers of `login`.
#[derive(Debug, Clone, Default)]
pub struct LoginOutcome {
    pub success: bool,
    pub admin: Option<AdminProfile>,
    pub token: Option<String>,
    pub error: Option<String>,
}

impl LoginOutcome {
    pub fn succeeded(session: IssuedSession) -> Self {
        Self {
            success: true,
            admin: Some(session.admin),
            token: Some(session.token),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// The account-creation payload, as the backend expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub bank_name: String,
    pub role: String,
}

/// The reviewer's verdict on one customer's risk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
    /// Feedback on an analysis without approving or rejecting it.
    FeedbackProvided,
}

/// The body of `POST /api/files/decision/{customer_id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_result_id: Option<String>,
    pub decision: Decision,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
}

/// How close the stored token is to its `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFreshness {
    /// No token is stored.
    Missing,
    /// The token has no expiry claim or expires outside the warning window.
    Fresh,
    /// The token expires within the warning window (or already has).
    ExpiringSoon { seconds_left: i64 },
    /// The token could not be decoded.
    Unreadable,
}

/// Session lifecycle notifications consumed by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { username: String },
    LoggedOut,
    SessionExpired { reason: String },
}

/// The three states every route guard moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Unauthorized,
}

/// Navigation state carried alongside a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub from: Box<Location>,
}

/// A router location: the path plus any state handed over by a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub state: Option<NavState>,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            state: None,
        }
    }

    /// Builds a location that remembers where the user was headed.
    pub fn with_from(pathname: impl Into<String>, from: Location) -> Self {
        Self {
            pathname: pathname.into(),
            state: Some(NavState {
                from: Box::new(from),
            }),
        }
    }

    /// The pathname recorded in `state.from`, if any.
    pub fn from_pathname(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.from.pathname.as_str())
    }
}
