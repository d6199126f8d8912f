//! Validated message containers.
//!
//! A [`ValidatedResponse`] certifies that signature trust validation has
//! already happened; decryption only accepts validated containers, so an
//! unvalidated response cannot reach the decrypter by construction.

use chrono::{DateTime, Utc};

use crate::types::{EncryptedAssertion, Issuer, Response, Status};

/// A response whose signature has been validated.
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    response: Response,
}

impl ValidatedResponse {
    /// Wraps a response that has passed signature trust validation.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self { response }
    }

    /// Returns the response ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.response.id
    }

    /// Returns the request ID this response answers, if any.
    #[must_use]
    pub fn in_response_to(&self) -> Option<&str> {
        self.response.in_response_to.as_deref()
    }

    /// Returns the issuer element, if present.
    #[must_use]
    pub fn issuer(&self) -> Option<&Issuer> {
        self.response.issuer.as_ref()
    }

    /// Returns the issue instant.
    #[must_use]
    pub fn issue_instant(&self) -> DateTime<Utc> {
        self.response.issue_instant
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.response.status
    }

    /// Returns the destination URL, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.response.destination.as_deref()
    }

    /// Returns true if the response status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response.is_success()
    }

    /// Returns the encrypted assertions carried by the response.
    #[must_use]
    pub fn encrypted_assertions(&self) -> &[EncryptedAssertion] {
        &self.response.encrypted_assertions
    }
}
