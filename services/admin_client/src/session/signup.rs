//! services/admin_client/src/session/signup.rs
//!
//! Account-creation form and its local validation rules.

use kyc_session_core::domain::SignupRequest;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_ROLE: &str = "admin";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern compiles"))
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub bank_name: String,
    pub role: String,
}

/// Per-field validation messages, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<(&'static str, &'static str)>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|(f, _)| *f == field).map(|(_, m)| *m)
    }

    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(_, message)| *message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, FieldErrors> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push(("username", "Username is required"));
        } else if username.chars().count() < 3 {
            errors.push(("username", "Username must be at least 3 characters"));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(("email", "Email is required"));
        } else if !email_pattern().is_match(email) {
            errors.push(("email", "Please enter a valid email address"));
        }

        if self.password.is_empty() {
            errors.push(("password", "Password is required"));
        } else if self.password.chars().count() < 6 {
            errors.push(("password", "Password must be at least 6 characters"));
        }

        if self.confirm_password.is_empty() {
            errors.push(("confirm_password", "Please confirm your password"));
        } else if self.password != self.confirm_password {
            errors.push(("confirm_password", "Passwords do not match"));
        }

        if self.full_name.trim().is_empty() {
            errors.push(("full_name", "Full name is required"));
        }
        if self.bank_name.trim().is_empty() {
            errors.push(("bank_name", "Bank name is required"));
        }

        if !errors.is_empty() {
            return Err(FieldErrors(errors));
        }

        let role = match self.role.trim() {
            "" => DEFAULT_ROLE.to_string(),
            role => role.to_string(),
        };

        Ok(SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            full_name: self.full_name.trim().to_string(),
            bank_name: self.bank_name.trim().to_string(),
            role,
        })
    }
}
