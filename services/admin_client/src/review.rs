//! services/admin_client/src/review.rs
//!
//! Review decisions on customer risk analyses. Every decision must carry
//! written feedback; the form is checked locally before anything is sent.

use kyc_session_core::domain::{Decision, DecisionRequest};
use serde::Deserialize;
use serde_json::Value;

pub const DECISION_PATH: &str = "/api/files/decision";
pub const PENDING_DECISIONS_PATH: &str = "/api/files/pending-decisions";
pub const MY_DECISIONS_PATH: &str = "/api/files/my-decisions";
pub const ML_RESULTS_PATH: &str = "/api/files/ml-results";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("Customer ID is required")]
    MissingCustomerId,
    #[error("Feedback is required for all decisions")]
    MissingFeedback,
    #[error("A risk override needs a reason")]
    MissingOverrideReason,
}

/// Raw decision input, before validation.
#[derive(Debug, Clone)]
pub struct DecisionForm {
    pub customer_id: String,
    pub ml_result_id: Option<String>,
    pub decision: Decision,
    pub feedback: String,
    pub risk_override: Option<String>,
    pub override_reason: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl DecisionForm {
    pub fn new(customer_id: impl Into<String>, decision: Decision, feedback: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ml_result_id: None,
            decision,
            feedback: feedback.into(),
            risk_override: None,
            override_reason: None,
        }
    }

    /// Returns the trimmed customer id and the request body.
    pub fn validate(&self) -> Result<(String, DecisionRequest), DecisionError> {
        let customer_id = self.customer_id.trim();
        if customer_id.is_empty() {
            return Err(DecisionError::MissingCustomerId);
        }
        let feedback = self.feedback.trim();
        if feedback.is_empty() {
            return Err(DecisionError::MissingFeedback);
        }

        let risk_override = non_blank(self.risk_override.as_deref());
        let override_reason = non_blank(self.override_reason.as_deref());
        if risk_override.is_some() && override_reason.is_none() {
            return Err(DecisionError::MissingOverrideReason);
        }

        Ok((
            customer_id.to_string(),
            DecisionRequest {
                ml_result_id: non_blank(self.ml_result_id.as_deref()),
                decision: self.decision,
                feedback: feedback.to_string(),
                risk_override,
                override_reason,
            },
        ))
    }
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PendingDecisions {
    #[serde(default)]
    pub pending_decisions: Vec<Value>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct MyDecisions {
    #[serde(default)]
    pub decisions: Vec<Value>,
}
