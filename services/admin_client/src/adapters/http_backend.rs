//! services/admin_client/src/adapters/http_backend.rs
//!
//! This module contains the adapter for the remote admin API. It implements the
//! `AuthBackend` port from the `core` crate using `reqwest`.

use async_trait::async_trait;
use kyc_session_core::domain::{AdminProfile, IssuedSession, LoginCredentials, SignupRequest};
use kyc_session_core::ports::{AuthBackend, PortError, PortResult};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const LOGIN_PATH: &str = "/api/admin/login";
pub const SIGNUP_PATH: &str = "/api/admin/signup";
pub const LOGOUT_PATH: &str = "/api/admin/logout";
pub const VALIDATE_TOKEN_PATH: &str = "/api/admin/validate-token";

//=========================================================================================
// Wire Types
//=========================================================================================

/// The `{ success, message, data }` wrapper every admin endpoint responds with.
#[derive(Deserialize, Debug)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) message: Option<String>,
    pub(crate) data: Option<T>,
}

#[derive(Deserialize, Debug)]
struct LoginData {
    token: String,
    admin: AdminProfile,
}

//=========================================================================================
// Shared Error Mapping
//=========================================================================================

/// Maps a transport-level `reqwest` failure onto the port error taxonomy.
pub fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout
    } else if e.is_connect() || e.is_request() {
        PortError::Network(e.to_string())
    } else if e.is_decode() {
        PortError::Malformed(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

/// Turns a non-success response into `PortError::Rejected`, keeping the
/// server's `message` when it sent one.
pub async fn rejection(response: Response) -> PortError {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
    PortError::Rejected {
        status: status.as_u16(),
        message,
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AuthBackend` port against the admin REST API.
///
/// It deliberately owns a plain client: these calls must not pass through the
/// authorizing `ApiClient`, or a rejected logout would recurse into another logout.
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
    login_timeout: Duration,
}

impl HttpAuthBackend {
    /// Creates a new `HttpAuthBackend`.
    pub fn new(client: Client, base_url: impl Into<String>, login_timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            login_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

//=========================================================================================
// `AuthBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> PortResult<IssuedSession> {
        info!("Login request for '{}' to {}", credentials.username, self.base_url);
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .timeout(self.login_timeout)
            .json(credentials)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let envelope: Envelope<LoginData> = response.json().await.map_err(transport_error)?;
        if !envelope.success {
            return Err(PortError::Rejected {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| PortError::Malformed("login response has no data".to_string()))?;
        if data.token.is_empty() {
            return Err(PortError::Malformed("login response has an empty token".to_string()));
        }

        Ok(IssuedSession {
            token: data.token,
            admin: data.admin,
        })
    }

    async fn signup(&self, request: &SignupRequest) -> PortResult<()> {
        info!("Signup request for '{}'", request.username);
        let response = self
            .client
            .post(self.url(SIGNUP_PATH))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let envelope: Envelope<Value> = response.json().await.map_err(transport_error)?;
        if envelope.success {
            Ok(())
        } else {
            Err(PortError::Rejected {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Signup was not accepted".to_string()),
            })
        }
    }

    async fn logout(&self, token: &str) -> PortResult<()> {
        let response = self
            .client
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }

    async fn validate_token(&self, token: &str) -> PortResult<bool> {
        let response = self
            .client
            .get(self.url(VALIDATE_TOKEN_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let envelope: Envelope<Value> = response.json().await.map_err(transport_error)?;
        debug!("Token validation answered success={}", envelope.success);
        Ok(envelope.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpAuthBackend {
        HttpAuthBackend::new(Client::new(), server.uri(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn login_parses_token_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({ "username": "jdoe", "password": "hunter22" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "token": "a.b.c",
                    "admin": { "username": "jdoe", "full_name": "Jane Doe", "bank_name": "FTB", "role": "admin", "email": "j@ftb.test" }
                }
            })))
            .mount(&server)
            .await;

        let session = backend(&server)
            .login(&LoginCredentials {
                username: "jdoe".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.token, "a.b.c");
        assert_eq!(session.admin.full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn login_rejection_keeps_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "success": false, "message": "bad creds" })),
            )
            .mount(&server)
            .await;

        let err = backend(&server)
            .login(&LoginCredentials {
                username: "jdoe".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Rejected { status: 401, ref message } if message == "bad creds"));
    }

    #[tokio::test]
    async fn login_success_without_data_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .login(&LoginCredentials {
                username: "jdoe".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Malformed(_)));
    }

    #[tokio::test]
    async fn validate_token_sends_bearer_and_reads_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VALIDATE_TOKEN_PATH))
            .and(header("Authorization", "Bearer a.b.c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        assert!(backend(&server).validate_token("a.b.c").await.unwrap());
        assert!(backend(&server).validate_token("other").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let backend = HttpAuthBackend::new(
            Client::new(),
            "http://127.0.0.1:1",
            Duration::from_secs(2),
        );
        let err = backend.logout("a.b.c").await.unwrap_err();
        assert!(matches!(err, PortError::Network(_)));
    }
}
