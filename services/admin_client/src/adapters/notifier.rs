//! services/admin_client/src/adapters/notifier.rs
//!
//! Routes user-facing notifications into the tracing pipeline.

use kyc_session_core::ports::Notifier;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "notify", "{}", message);
    }
}
