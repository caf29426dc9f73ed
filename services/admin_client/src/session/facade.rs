//! services/admin_client/src/session/facade.rs
//!
//! The Auth Facade: the one integration point the rest of the client uses to
//! read, establish and tear down a session.

use kyc_session_core::domain::{
    IssuedSession, LoginCredentials, LoginOutcome, SessionEvent, TokenFreshness,
};
use kyc_session_core::ports::{AuthBackend, Notifier, PortError};
use kyc_session_core::{SessionValidator, TokenStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::session::signup::SignupForm;

const EVENT_CAPACITY: usize = 16;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please login again.";

pub struct AuthFacade {
    validator: SessionValidator,
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthFacade {
    pub fn new(
        validator: SessionValidator,
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            validator,
            backend,
            notifier,
            events,
        }
    }

    /// Session lifecycle events. The routing layer listens here instead of the
    /// facade navigating on its own.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn tokens(&self) -> &TokenStore {
        self.validator.tokens()
    }

    pub fn is_authenticated(&self) -> bool {
        self.validator.is_authenticated()
    }

    pub fn is_valid_session(&self) -> bool {
        self.validator.is_valid_session()
    }

    /// The stored token, if present and not locally expired.
    pub fn live_token(&self) -> Option<String> {
        self.validator.live_token()
    }

    pub fn refresh_token_if_needed(&self) -> TokenFreshness {
        self.validator.refresh_token_if_needed()
    }

    /// Asks the backend whether the stored token is still honoured.
    /// Never fails: every error resolves to `false`.
    pub async fn validate_token_with_backend(&self) -> bool {
        let Some(token) = self.tokens().get_token() else {
            return false;
        };

        match self.backend.validate_token(&token).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Token validation failed: {}", e);
                false
            }
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> LoginOutcome {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            let message = "Please fill in all required fields";
            self.notifier.error(message);
            return LoginOutcome::failed(message);
        }

        let session = match self.backend.login(credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!("Login error: {:?}", e);
                let message = login_failure_message(&e);
                self.notifier.error(&message);
                return LoginOutcome::failed(message);
            }
        };

        if let Err(e) = self.persist(&session) {
            error!("Failed to store session: {:?}", e);
            self.tokens().remove_token();
            let message = "Could not save the session locally";
            self.notifier.error(message);
            return LoginOutcome::failed(message);
        }

        info!("Admin '{}' logged in", session.admin.username);
        self.notifier
            .success(&format!("Welcome back, {}!", session.admin.full_name));
        self.emit(SessionEvent::LoggedIn {
            username: session.admin.username.clone(),
        });
        LoginOutcome::succeeded(session)
    }

    fn persist(&self, session: &IssuedSession) -> Result<(), PortError> {
        self.tokens().set_token(&session.token)?;
        self.tokens().set_admin(&session.admin)
    }

    /// Validates the form locally, then creates the account. The new admin
    /// still has to log in afterwards.
    pub async fn signup(&self, form: &SignupForm) -> Result<(), String> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(errors) => {
                self.notifier.error("Please fix the errors below");
                return Err(errors.summary());
            }
        };

        match self.backend.signup(&request).await {
            Ok(()) => {
                self.notifier
                    .success("Account created successfully! Please login.");
                Ok(())
            }
            Err(e) => {
                error!("Signup error: {:?}", e);
                let message = match e {
                    PortError::Rejected { message, .. } => message,
                    _ => "Something went wrong. Please try again.".to_string(),
                };
                self.notifier.error(&message);
                Err(message)
            }
        }
    }

    /// Best-effort backend logout, then an unconditional local logout.
    pub async fn logout(&self) {
        self.end_session().await;
        self.notifier.success("Logged out successfully");
        self.emit(SessionEvent::LoggedOut);
    }

    /// Logout triggered by a rejected or expired session rather than the user.
    pub async fn expire_session(&self, reason: &str) {
        self.end_session().await;
        self.notifier.error(reason);
        self.emit(SessionEvent::SessionExpired {
            reason: reason.to_string(),
        });
    }

    async fn end_session(&self) {
        if let Some(token) = self.tokens().get_token() {
            if let Err(e) = self.backend.logout(&token).await {
                warn!("Backend logout failed, proceeding with local logout: {}", e);
            }
        }
        self.tokens().remove_token();
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine: nothing is routing yet.
        let _ = self.events.send(event);
    }
}

/// The message shown to the admin when a login attempt fails.
pub fn login_failure_message(error: &PortError) -> String {
    match error {
        PortError::Network(_) => "Network error - please check your internet connection".to_string(),
        PortError::Timeout => "Login timeout - please try again".to_string(),
        PortError::Rejected { status: 401, .. } => "Invalid username or password".to_string(),
        PortError::Rejected { status: 403, .. } => {
            "Access forbidden - account may be disabled".to_string()
        }
        PortError::Rejected { status: 404, .. } => {
            "Login service not found - please contact support".to_string()
        }
        PortError::Rejected { status: 500, .. } => "Server error - please try again later".to_string(),
        PortError::Rejected {
            status: 502 | 503, ..
        } => "Service temporarily unavailable - please try again".to_string(),
        PortError::Rejected { message, .. } if !message.is_empty() => message.clone(),
        _ => "Login failed. Please try again.".to_string(),
    }
}
