//! SAML authentication requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signature::XmlSignature;

use super::{Issuer, SignableMessage};

/// A SAML authentication request.
///
/// The hub validates inbound request signatures the same way it validates
/// responses and assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity that issued this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// The URL where this request was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Enveloped signature, if the request is signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<XmlSignature>,
}

impl AuthnRequest {
    /// Creates a new unsigned request from the given issuer.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            issue_instant: Utc::now(),
            issuer: Some(Issuer::new(issuer)),
            destination: None,
            signature: None,
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Attaches a signature element.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Replaces the issuer element. Used to model malformed peer input.
    #[must_use]
    pub fn with_issuer(mut self, issuer: Option<Issuer>) -> Self {
        self.issuer = issuer;
        self
    }
}

impl SignableMessage for AuthnRequest {
    fn issuer(&self) -> Option<&Issuer> {
        self.issuer.as_ref()
    }

    fn signature(&self) -> Option<&XmlSignature> {
        self.signature.as_ref()
    }
}
