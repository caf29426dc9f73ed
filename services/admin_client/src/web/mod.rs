pub mod api_client;
pub mod guards;
pub mod router;
pub mod state;

pub use api_client::{ApiClient, ApiFailure};
pub use guards::{AuthGuard, GuardDecision, ProtectedRoute};
pub use router::{Navigation, Router};
pub use state::AppState;
