//! crates/kyc_session_core/src/validator.rs
//!
//! Local session validity: decides from stored data alone whether the admin
//! still holds a usable session.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use crate::domain::TokenFreshness;
use crate::ports::Clock;
use crate::store::TokenStore;
use crate::token;

#[derive(Clone)]
pub struct SessionValidator {
    tokens: TokenStore,
    clock: Arc<dyn Clock>,
    expiry_warning: Duration,
}

impl SessionValidator {
    pub fn new(tokens: TokenStore, clock: Arc<dyn Clock>, expiry_warning: Duration) -> Self {
        Self {
            tokens,
            clock,
            expiry_warning,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn is_token_expired(&self, token: &str) -> bool {
        token::is_token_expired(token, self.clock.now())
    }

    /// Token and profile are both present. Expiry is not considered.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.get_token().is_some() && self.tokens.get_admin().is_some()
    }

    /// Local validity. An expired token is removed from the store as a side effect.
    pub fn is_valid_session(&self) -> bool {
        let Some(token) = self.tokens.get_token() else {
            return false;
        };

        if self.is_token_expired(&token) {
            info!("Stored token has expired, clearing session");
            self.tokens.remove_token();
            return false;
        }

        self.is_authenticated()
    }

    /// The stored token if it exists and has not expired locally.
    pub fn live_token(&self) -> Option<String> {
        self.tokens
            .get_token()
            .filter(|token| !self.is_token_expired(token))
    }

    /// Reports whether the stored token is about to expire. There is no refresh
    /// endpoint, so callers can only warn or prompt for a new login.
    pub fn refresh_token_if_needed(&self) -> TokenFreshness {
        let Some(token) = self.tokens.get_token() else {
            return TokenFreshness::Missing;
        };

        match token::seconds_until_expiry(&token, self.clock.now()) {
            Ok(Some(seconds_left)) if seconds_left < self.expiry_warning.num_seconds() => {
                info!("Token expires in {}s, a new login will be needed soon", seconds_left);
                TokenFreshness::ExpiringSoon { seconds_left }
            }
            Ok(_) => TokenFreshness::Fresh,
            Err(e) => {
                debug!("Error checking token expiry: {}", e);
                TokenFreshness::Unreadable
            }
        }
    }
}
