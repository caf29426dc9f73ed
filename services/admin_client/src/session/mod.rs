pub mod context;
pub mod facade;
pub mod signup;

pub use context::{AuthAction, AuthContext, AuthState};
pub use facade::{AuthFacade, SESSION_EXPIRED_MESSAGE};
pub use signup::SignupForm;
