//! services/admin_client/src/web/api_client.rs
//!
//! The authorizing HTTP client every non-auth call goes through. It is built
//! once at startup from the session facade: outgoing requests carry the
//! current bearer token, and any 401 response ends the session.

use kyc_session_core::ports::PortError;
use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::adapters::http_backend::{rejection, transport_error, Envelope};
use crate::config::Config;
use crate::error::ClientError;
use crate::review::{
    DecisionForm, MyDecisions, PendingDecisions, DECISION_PATH, ML_RESULTS_PATH,
    MY_DECISIONS_PATH, PENDING_DECISIONS_PATH,
};
use crate::session::AuthFacade;

pub const UPLOAD_PATH: &str = "/api/files/upload";

/// A failed API call, already phrased for the admin.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiFailure {
    fn local(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    fn from_port(error: PortError) -> Self {
        let status = match &error {
            PortError::Rejected { status, .. } => Some(*status),
            PortError::Unauthorized => Some(401),
            _ => None,
        };
        Self {
            status,
            message: request_failure_message(&error),
        }
    }
}

/// The message shown for a failed API request.
pub fn request_failure_message(error: &PortError) -> String {
    match error {
        PortError::Timeout => "Request timeout - please try again".to_string(),
        PortError::Network(_) => "Network error - please check your connection".to_string(),
        PortError::Unauthorized | PortError::Rejected { status: 401, .. } => {
            "Session expired - please login again".to_string()
        }
        PortError::Rejected { status: 403, .. } => "Access denied".to_string(),
        PortError::Rejected { status: 404, .. } => "Resource not found".to_string(),
        PortError::Rejected { status: 429, .. } => {
            "Too many requests - please wait and try again".to_string()
        }
        PortError::Rejected { status, .. } if *status >= 500 => {
            "Server error - please try again later".to_string()
        }
        PortError::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    upload_timeout: Duration,
    facade: Arc<AuthFacade>,
}

impl ApiClient {
    pub fn new(config: &Config, facade: Arc<AuthFacade>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            upload_timeout: config.upload_timeout,
            facade,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the bearer token when a locally valid one is stored.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.facade.live_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder, label: &str) -> Result<reqwest::Response, ApiFailure> {
        info!("API Request: {}", label);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                error!("API request {} failed: {}", label, e);
                ApiFailure::from_port(transport_error(e))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("Authentication failed on {} - ending session", label);
            self.facade
                .expire_session("Session expired - please login again")
                .await;
            return Err(ApiFailure::from_port(PortError::Unauthorized));
        }
        if !status.is_success() {
            let failure = ApiFailure::from_port(rejection(response).await);
            error!("Server error {} on {}: {}", status.as_u16(), label, failure.message);
            return Err(failure);
        }

        info!("API Response: {} {}", status.as_u16(), label);
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiFailure> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiFailure::from_port(transport_error(e)))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiFailure> {
        let response = self
            .execute(self.http.get(self.url(path)), &format!("GET {path}"))
            .await?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiFailure>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.http.post(self.url(path)).json(body), &format!("POST {path}"))
            .await?;
        Self::decode(response).await
    }

    /// Uploads one customer document. Only the transport contract lives here;
    /// the backend owns everything that happens to the file afterwards.
    pub async fn upload_document(
        &self,
        customer_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ApiFailure> {
        let path = format!("{UPLOAD_PATH}/{customer_id}");
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let request = self
            .http
            .post(self.url(&path))
            .timeout(self.upload_timeout)
            .multipart(form);

        let response = self.execute(request, &format!("UPLOAD {path}")).await?;
        Self::decode(response).await
    }

    /// Opens the `{ success, message, data }` wrapper, turning `success: false`
    /// into a failure carrying the backend's message.
    fn unwrap_envelope<T: Default>(envelope: Envelope<T>, fallback: &str) -> Result<T, ApiFailure> {
        if !envelope.success {
            return Err(ApiFailure::local(
                envelope.message.unwrap_or_else(|| fallback.to_string()),
            ));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// Records a review decision. The form is validated first; an invalid
    /// form never reaches the network.
    pub async fn submit_decision(&self, form: &DecisionForm) -> Result<Value, ApiFailure> {
        let (customer_id, request) = form
            .validate()
            .map_err(|e| ApiFailure::local(e.to_string()))?;
        let envelope: Envelope<Value> = self
            .post_json(&format!("{DECISION_PATH}/{customer_id}"), &request)
            .await?;
        let data = Self::unwrap_envelope(envelope, "Decision was not recorded")?;
        info!("Decision {:?} recorded for {}", request.decision, customer_id);
        Ok(data)
    }

    /// Analyses still waiting for a reviewer.
    pub async fn pending_decisions(&self) -> Result<Vec<Value>, ApiFailure> {
        let envelope: Envelope<PendingDecisions> = self.get_json(PENDING_DECISIONS_PATH).await?;
        Ok(Self::unwrap_envelope(envelope, "Could not load pending decisions")?.pending_decisions)
    }

    /// Decisions the signed-in admin has already made.
    pub async fn my_decisions(&self) -> Result<Vec<Value>, ApiFailure> {
        let envelope: Envelope<MyDecisions> = self.get_json(MY_DECISIONS_PATH).await?;
        Ok(Self::unwrap_envelope(envelope, "Could not load decisions")?.decisions)
    }

    pub async fn ml_results(&self, customer_id: &str) -> Result<Value, ApiFailure> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() {
            return Err(ApiFailure::local("Customer ID is required"));
        }
        let envelope: Envelope<Value> = self
            .get_json(&format!("{ML_RESULTS_PATH}/{customer_id}"))
            .await?;
        Self::unwrap_envelope(envelope, "No ML results found for this customer")
    }
}
