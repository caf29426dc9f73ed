//! services/admin_client/src/web/router.rs
//!
//! Owns the current location, runs the right guard for each path and follows
//! redirects. It is also the only place that reacts to session events by
//! navigating, so the facade never has to.

use kyc_session_core::domain::{Location, SessionEvent};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::session::AuthFacade;
use crate::web::guards::{
    AuthGuard, GuardDecision, ProtectedRoute, DASHBOARD_PATH, LOGIN_PATH, SIGNUP_PATH,
};

const MAX_REDIRECTS: usize = 5;

/// Which guard, if any, wraps a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    AuthPage,
    Protected,
}

pub fn route_kind(pathname: &str) -> RouteKind {
    match pathname {
        LOGIN_PATH | SIGNUP_PATH => RouteKind::AuthPage,
        p if p == DASHBOARD_PATH || p.starts_with("/dashboard/") => RouteKind::Protected,
        _ => RouteKind::Public,
    }
}

/// The result of one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The page at `location` was rendered, after `redirects` hops.
    Rendered { location: Location, redirects: usize },
    /// A newer navigation started before this one finished.
    Superseded,
    /// Guards kept bouncing between pages. The last target is reported and
    /// nothing is rendered.
    RedirectLoop { last: Location },
}

pub struct Router {
    facade: Arc<AuthFacade>,
    auth_guard: AuthGuard,
    protected: ProtectedRoute,
    location: Mutex<Location>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

/// Counts a navigation as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Router {
    pub fn new(facade: Arc<AuthFacade>) -> Self {
        Self {
            auth_guard: AuthGuard::new(facade.clone()),
            protected: ProtectedRoute::new(facade.clone()),
            facade,
            location: Mutex::new(Location::new("/")),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> Location {
        self.location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|_| Location::new("/"))
    }

    pub fn protected_route(&self) -> &ProtectedRoute {
        &self.protected
    }

    pub fn auth_guard(&self) -> &AuthGuard {
        &self.auth_guard
    }

    /// No navigation is running and the admin is not already on a login page.
    fn should_redirect(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
            && route_kind(&self.current().pathname) != RouteKind::AuthPage
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Navigates to `target`, following guard redirects until a page renders.
    pub async fn navigate(&self, target: Location) -> Navigation {
        let _in_flight = InFlight::enter(&self.in_flight);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut target = target;
        let mut redirects = 0;

        loop {
            if route_kind(&target.pathname) != RouteKind::Protected {
                self.protected.cancel();
            }

            let decision = match route_kind(&target.pathname) {
                RouteKind::Public => GuardDecision::Render,
                RouteKind::AuthPage => self.auth_guard.evaluate(&target),
                RouteKind::Protected => self.protected.check(&target).await,
            };

            if !self.is_latest(generation) {
                return Navigation::Superseded;
            }

            match decision {
                GuardDecision::Render | GuardDecision::Loading => {
                    if let Ok(mut location) = self.location.lock() {
                        *location = target.clone();
                    }
                    info!("Rendered {}", target.pathname);
                    return Navigation::Rendered {
                        location: target,
                        redirects,
                    };
                }
                GuardDecision::Redirect { to } => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        warn!("Redirect loop while navigating, stopping at {}", to.pathname);
                        return Navigation::RedirectLoop { last: to };
                    }
                    info!("Redirecting {} -> {}", target.pathname, to.pathname);
                    target = to;
                }
                GuardDecision::Stale => return Navigation::Superseded,
            }
        }
    }

    /// Sends the admin to the login page whenever the session ends. A navigation
    /// already in flight is left alone: its guards see the cleared session.
    pub fn spawn_session_listener(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let router = Arc::clone(self);
        let mut events = self.facade.subscribe();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => event,
                };

                match event {
                    Ok(SessionEvent::LoggedOut) => {
                        if router.should_redirect() {
                            router.navigate(Location::new(LOGIN_PATH)).await;
                        }
                    }
                    Ok(SessionEvent::SessionExpired { reason }) => {
                        info!("Session ended: {}", reason);
                        if !router.should_redirect() {
                            continue;
                        }
                        // Come back to the protected page after the next login.
                        let current = router.current();
                        let target = match route_kind(&current.pathname) {
                            RouteKind::Protected => Location::with_from(LOGIN_PATH, current),
                            _ => Location::new(LOGIN_PATH),
                        };
                        router.navigate(target).await;
                    }
                    Ok(SessionEvent::LoggedIn { username }) => {
                        info!("Session started for {}", username);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session listener skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
