//! services/admin_client/src/web/state.rs
//!
//! Defines the application state, created once at startup. It owns the single
//! authorizing `ApiClient` and the router's session listener, and tears both
//! down on shutdown.

use crate::adapters::{FileSessionStore, HttpAuthBackend, TracingNotifier};
use crate::config::Config;
use crate::error::ClientError;
use crate::session::{AuthContext, AuthFacade};
use crate::web::api_client::ApiClient;
use crate::web::router::Router;
use kyc_session_core::ports::{AuthBackend, Notifier, SessionStore, SystemClock};
use kyc_session_core::{SessionValidator, TokenStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

//=========================================================================================
// AppState (Shared Across the Whole Client)
//=========================================================================================

pub struct AppState {
    pub config: Arc<Config>,
    pub facade: Arc<AuthFacade>,
    pub context: Arc<AuthContext>,
    pub api: ApiClient,
    pub router: Arc<Router>,
    shutdown: CancellationToken,
    listener: JoinHandle<()>,
}

impl AppState {
    /// Wires the production adapters: a session file, the HTTP backend and
    /// tracing notifications.
    pub fn init(config: Config) -> Result<Self, ClientError> {
        let store = Arc::new(FileSessionStore::new(config.session_path.clone()));
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let backend = Arc::new(HttpAuthBackend::new(
            http,
            config.api_base_url.clone(),
            config.login_timeout,
        ));
        Self::with_adapters(config, store, backend, Arc::new(TracingNotifier))
    }

    /// Wires the state around caller-supplied adapters. Must be called from
    /// within a Tokio runtime.
    pub fn with_adapters(
        config: Config,
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let config = Arc::new(config);
        let expiry_warning = chrono::Duration::from_std(config.expiry_warning)
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        let validator = SessionValidator::new(
            TokenStore::new(store),
            Arc::new(SystemClock),
            expiry_warning,
        );
        let facade = Arc::new(AuthFacade::new(validator, backend, notifier));
        let context = Arc::new(AuthContext::new(facade.clone()));
        let api = ApiClient::new(&config, facade.clone())?;
        let router = Arc::new(Router::new(facade.clone()));

        let shutdown = CancellationToken::new();
        let listener = router.spawn_session_listener(shutdown.clone());
        info!("Client state initialised against {}", config.api_base_url);

        Ok(Self {
            config,
            facade,
            context,
            api,
            router,
            shutdown,
            listener,
        })
    }

    /// Stops the session listener and waits for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.listener.await {
            warn!("Session listener ended abnormally: {}", e);
        }
    }
}
