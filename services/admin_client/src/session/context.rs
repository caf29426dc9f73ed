//! services/admin_client/src/session/context.rs
//!
//! Observable auth state for UI surfaces. A pure reducer owns the state
//! transitions; `AuthContext` drives it from the facade.

use kyc_session_core::domain::{AdminProfile, LoginCredentials, LoginOutcome};
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::session::facade::AuthFacade;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub admin: Option<AdminProfile>,
    pub token: Option<String>,
    pub loading: bool,
    pub validating_token: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            admin: None,
            token: None,
            loading: true,
            validating_token: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess { admin: AdminProfile, token: String },
    LoginFailure { error: String },
    Logout,
    TokenValidationStart,
    TokenValidationSuccess { admin: AdminProfile, token: String },
    TokenValidationFailure { error: String },
    SetLoading(bool),
}

pub fn reduce(state: &AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginStart => AuthState {
            loading: true,
            error: None,
            ..state.clone()
        },
        AuthAction::LoginSuccess { admin, token }
        | AuthAction::TokenValidationSuccess { admin, token } => AuthState {
            is_authenticated: true,
            admin: Some(admin),
            token: Some(token),
            loading: false,
            validating_token: false,
            error: None,
        },
        AuthAction::LoginFailure { error } => AuthState {
            is_authenticated: false,
            admin: None,
            token: None,
            loading: false,
            error: Some(error),
            ..state.clone()
        },
        AuthAction::Logout => AuthState {
            is_authenticated: false,
            admin: None,
            token: None,
            loading: false,
            error: None,
            ..state.clone()
        },
        AuthAction::TokenValidationStart => AuthState {
            validating_token: true,
            ..state.clone()
        },
        AuthAction::TokenValidationFailure { error } => AuthState {
            is_authenticated: false,
            admin: None,
            token: None,
            validating_token: false,
            loading: false,
            error: Some(error),
        },
        AuthAction::SetLoading(loading) => AuthState {
            loading,
            ..state.clone()
        },
    }
}

pub struct AuthContext {
    facade: Arc<AuthFacade>,
    state: Mutex<AuthState>,
}

impl AuthContext {
    pub fn new(facade: Arc<AuthFacade>) -> Self {
        Self {
            facade,
            state: Mutex::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn dispatch(&self, action: AuthAction) {
        if let Ok(mut state) = self.state.lock() {
            *state = reduce(&state, action);
        }
    }

    /// Restores state at startup: a locally valid session is confirmed with the
    /// backend, and a rejected one is wiped.
    pub async fn initialize(&self) {
        self.dispatch(AuthAction::SetLoading(true));

        if !self.facade.is_valid_session() {
            self.dispatch(AuthAction::SetLoading(false));
            return;
        }

        let tokens = self.facade.tokens();
        let (Some(token), Some(admin)) = (tokens.get_token(), tokens.get_admin()) else {
            self.dispatch(AuthAction::SetLoading(false));
            return;
        };

        self.dispatch(AuthAction::TokenValidationStart);
        if self.facade.validate_token_with_backend().await {
            self.dispatch(AuthAction::TokenValidationSuccess { admin, token });
        } else {
            tokens.remove_token();
            self.dispatch(AuthAction::TokenValidationFailure {
                error: "Token validation failed".to_string(),
            });
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> LoginOutcome {
        self.dispatch(AuthAction::LoginStart);
        let outcome = self.facade.login(credentials).await;
        match (&outcome.admin, &outcome.token) {
            (Some(admin), Some(token)) if outcome.success => self.dispatch(AuthAction::LoginSuccess {
                admin: admin.clone(),
                token: token.clone(),
            }),
            _ => self.dispatch(AuthAction::LoginFailure {
                error: outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "Login failed".to_string()),
            }),
        }
        outcome
    }

    pub async fn logout(&self) {
        self.facade.logout().await;
        self.dispatch(AuthAction::Logout);
    }

    pub fn check_auth(&self) -> bool {
        self.facade.is_valid_session() && self.state().is_authenticated
    }

    /// Re-confirms the session with the backend, logging out if it is gone.
    pub async fn refresh_auth(&self) -> bool {
        if !self.facade.is_valid_session() {
            self.logout().await;
            return false;
        }

        self.dispatch(AuthAction::TokenValidationStart);
        if self.facade.validate_token_with_backend().await {
            let tokens = self.facade.tokens();
            if let (Some(token), Some(admin)) = (tokens.get_token(), tokens.get_admin()) {
                self.dispatch(AuthAction::TokenValidationSuccess { admin, token });
                return true;
            }
            error!("Session vanished during refresh");
        }

        self.dispatch(AuthAction::TokenValidationFailure {
            error: "Token validation failed".to_string(),
        });
        self.logout().await;
        false
    }
}
