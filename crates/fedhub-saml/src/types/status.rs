//! SAML status codes.

use serde::{Deserialize, Serialize};

use super::constants::status_codes;

/// The status of a SAML response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The top-level status code URI.
    pub code: String,

    /// Optional human-readable status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: status_codes::SUCCESS.to_string(),
            message: None,
        }
    }

    /// Creates a responder-error status with a message.
    #[must_use]
    pub fn responder(message: impl Into<String>) -> Self {
        Self {
            code: status_codes::RESPONDER.to_string(),
            message: Some(message.into()),
        }
    }

    /// Creates an authentication-failed status with a message.
    #[must_use]
    pub fn authn_failed(message: impl Into<String>) -> Self {
        Self {
            code: status_codes::AUTHN_FAILED.to_string(),
            message: Some(message.into()),
        }
    }

    /// Returns true if this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == status_codes::SUCCESS
    }
}
