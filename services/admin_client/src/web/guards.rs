//! services/admin_client/src/web/guards.rs
//!
//! Route guards. `AuthGuard` keeps signed-in admins off the public login and
//! signup pages; `ProtectedRoute` admits admins to protected pages only after
//! the backend confirms the token.
//!
//! The two guards differ in strictness on purpose: leaving a public page only
//! needs local validity, entering protected content needs the backend.

use kyc_session_core::domain::{GuardState, Location};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{AuthFacade, SESSION_EXPIRED_MESSAGE};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// What the routing layer should do with the guarded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The check is still running; show a loading indicator.
    Loading,
    /// Render the guarded page.
    Render,
    /// Replace the current location with `to`.
    Redirect { to: Location },
    /// The check was superseded or cancelled; its result must not be applied.
    Stale,
}

impl GuardDecision {
    fn redirect_to_login(from: &Location) -> Self {
        GuardDecision::Redirect {
            to: Location::with_from(LOGIN_PATH, Location::new(from.pathname.clone())),
        }
    }
}

//=========================================================================================
// AuthGuard
//=========================================================================================

pub struct AuthGuard {
    facade: Arc<AuthFacade>,
    state: Mutex<GuardState>,
}

impl AuthGuard {
    pub fn new(facade: Arc<AuthFacade>) -> Self {
        Self {
            facade,
            state: Mutex::new(GuardState::Checking),
        }
    }

    pub fn state(&self) -> GuardState {
        self.state.lock().map(|s| *s).unwrap_or(GuardState::Checking)
    }

    fn set_state(&self, next: GuardState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// Runs on every mount or location change of `/login` and `/signup`.
    pub fn evaluate(&self, location: &Location) -> GuardDecision {
        self.set_state(GuardState::Checking);

        if self.facade.is_valid_session() {
            self.set_state(GuardState::Authorized);
            let target = location.from_pathname().unwrap_or(DASHBOARD_PATH);
            debug!("Already signed in, leaving {} for {}", location.pathname, target);
            return GuardDecision::Redirect {
                to: Location::new(target),
            };
        }

        self.set_state(GuardState::Unauthorized);
        GuardDecision::Render
    }
}

//=========================================================================================
// ProtectedRoute
//=========================================================================================

/// One in-flight check. Only the newest ticket may settle the guard.
#[derive(Debug, Clone)]
pub struct CheckTicket {
    generation: u64,
    cancel: CancellationToken,
    id: Uuid,
}

pub struct ProtectedRoute {
    facade: Arc<AuthFacade>,
    generation: AtomicU64,
    current: Mutex<CancellationToken>,
    state: Mutex<GuardState>,
}

impl ProtectedRoute {
    pub fn new(facade: Arc<AuthFacade>) -> Self {
        Self {
            facade,
            generation: AtomicU64::new(0),
            current: Mutex::new(CancellationToken::new()),
            state: Mutex::new(GuardState::Checking),
        }
    }

    pub fn state(&self) -> GuardState {
        self.state.lock().map(|s| *s).unwrap_or(GuardState::Checking)
    }

    /// `Loading` while the latest check is still running.
    pub fn interim(&self) -> Option<GuardDecision> {
        (self.state() == GuardState::Checking).then_some(GuardDecision::Loading)
    }

    /// Starts a new check, cancelling whichever one was in flight.
    pub fn begin(&self) -> CheckTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            current.cancel();
            *current = cancel.clone();
        }
        if let Ok(mut state) = self.state.lock() {
            *state = GuardState::Checking;
        }
        CheckTicket {
            generation,
            cancel,
            id: Uuid::new_v4(),
        }
    }

    /// Abandons the in-flight check, e.g. when the page unmounts.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(current) = self.current.lock() {
            current.cancel();
        }
    }

    fn is_current(&self, ticket: &CheckTicket) -> bool {
        !ticket.cancel.is_cancelled() && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    fn settle(&self, ticket: &CheckTicket, next: GuardState, decision: GuardDecision) -> GuardDecision {
        if !self.is_current(ticket) {
            debug!("Discarding stale auth check {}", ticket.id);
            return GuardDecision::Stale;
        }
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
        decision
    }

    /// Runs on every mount or pathname change of a protected page.
    pub async fn check(&self, location: &Location) -> GuardDecision {
        let ticket = self.begin();
        self.run(&ticket, location).await
    }

    pub async fn run(&self, ticket: &CheckTicket, location: &Location) -> GuardDecision {
        if !self.facade.is_valid_session() {
            info!("Local session invalid - redirecting to login");
            return self.settle(
                ticket,
                GuardState::Unauthorized,
                GuardDecision::redirect_to_login(location),
            );
        }

        let confirmed = tokio::select! {
            _ = ticket.cancel.cancelled() => return GuardDecision::Stale,
            confirmed = self.facade.validate_token_with_backend() => confirmed,
        };

        if !self.is_current(ticket) {
            debug!("Discarding stale auth check {}", ticket.id);
            return GuardDecision::Stale;
        }

        if confirmed {
            return self.settle(ticket, GuardState::Authorized, GuardDecision::Render);
        }

        info!("Backend validation failed - session expired");
        self.facade.expire_session(SESSION_EXPIRED_MESSAGE).await;
        self.settle(
            ticket,
            GuardState::Unauthorized,
            GuardDecision::redirect_to_login(location),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::facade::tests::{admin, day_token, facade_with, FakeBackend};
    use kyc_session_core::ports::PortError;

    fn signed_in(backend: Arc<FakeBackend>) -> Arc<AuthFacade> {
        let (facade, _) = facade_with(backend);
        facade.tokens().set_token(&day_token()).unwrap();
        facade.tokens().set_admin(&admin()).unwrap();
        Arc::new(facade)
    }

    #[test]
    fn auth_guard_renders_login_for_anonymous_admins() {
        let (facade, _) = facade_with(Arc::new(FakeBackend::default()));
        let guard = AuthGuard::new(Arc::new(facade));
        assert_eq!(guard.evaluate(&Location::new(LOGIN_PATH)), GuardDecision::Render);
        assert_eq!(guard.state(), GuardState::Unauthorized);
    }

    #[test]
    fn auth_guard_returns_signed_in_admins_where_they_came_from() {
        let guard = AuthGuard::new(signed_in(Arc::new(FakeBackend::default())));

        let plain = guard.evaluate(&Location::new(LOGIN_PATH));
        assert_eq!(
            plain,
            GuardDecision::Redirect {
                to: Location::new(DASHBOARD_PATH)
            }
        );

        let with_from = guard.evaluate(&Location::with_from(
            SIGNUP_PATH,
            Location::new("/dashboard/history"),
        ));
        assert_eq!(
            with_from,
            GuardDecision::Redirect {
                to: Location::new("/dashboard/history")
            }
        );
        assert_eq!(guard.state(), GuardState::Authorized);
    }

    #[tokio::test]
    async fn protected_route_admits_confirmed_sessions() {
        let route = ProtectedRoute::new(signed_in(Arc::new(FakeBackend::default())));
        assert_eq!(route.interim(), Some(GuardDecision::Loading));
        let decision = route.check(&Location::new(DASHBOARD_PATH)).await;
        assert_eq!(decision, GuardDecision::Render);
        assert_eq!(route.state(), GuardState::Authorized);
        assert_eq!(route.interim(), None);
    }

    #[tokio::test]
    async fn protected_route_logs_out_on_backend_error() {
        let backend = Arc::new(FakeBackend::default());
        *backend.validate_result.lock().unwrap() = Some(Err(PortError::Timeout));
        let facade = signed_in(backend);
        let route = ProtectedRoute::new(facade.clone());

        let decision = route.check(&Location::new(DASHBOARD_PATH)).await;

        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: Location::with_from(LOGIN_PATH, Location::new(DASHBOARD_PATH))
            }
        );
        assert_eq!(facade.tokens().get_token(), None);
        assert_eq!(route.state(), GuardState::Unauthorized);
    }

    #[tokio::test]
    async fn superseded_ticket_is_discarded() {
        let route = ProtectedRoute::new(signed_in(Arc::new(FakeBackend::default())));
        let location = Location::new(DASHBOARD_PATH);

        let first = route.begin();
        let second = route.begin();
        assert!(first.cancel.is_cancelled());

        assert_eq!(route.run(&first, &location).await, GuardDecision::Stale);
        assert_eq!(route.run(&second, &location).await, GuardDecision::Render);
    }

    #[tokio::test]
    async fn cancelled_check_never_applies_its_result() {
        let facade = signed_in(Arc::new(FakeBackend::default()));
        let route = ProtectedRoute::new(facade);
        let ticket = route.begin();
        route.cancel();

        assert_eq!(
            route.run(&ticket, &Location::new(DASHBOARD_PATH)).await,
            GuardDecision::Stale
        );
        assert_eq!(route.state(), GuardState::Checking);
    }
}
