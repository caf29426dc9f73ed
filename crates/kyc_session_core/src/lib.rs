pub mod domain;
pub mod ports;
pub mod store;
pub mod token;
pub mod validator;

pub use domain::{
    AdminProfile, Decision, DecisionRequest, GuardState, IssuedSession, Location, LoginCredentials,
    LoginOutcome, NavState, SessionEvent, SignupRequest, TokenFreshness,
};
pub use ports::{
    AuthBackend, Clock, Notifier, PortError, PortResult, SessionKey, SessionStore, SystemClock,
};
pub use store::TokenStore;
pub use validator::SessionValidator;
