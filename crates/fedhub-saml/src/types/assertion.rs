//! SAML assertions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signature::XmlSignature;

use super::{Issuer, SignableMessage};

/// A SAML assertion: a statement about a subject made by an issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// The entity that issued the assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// Timestamp when the assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The subject's name identifier, if stated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Attribute statements about the subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    /// Enveloped signature, if the assertion is signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<XmlSignature>,
}

impl Assertion {
    /// Creates a new unsigned assertion from the given issuer.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            issuer: Some(Issuer::new(issuer)),
            issue_instant: Utc::now(),
            subject: None,
            attributes: Vec::new(),
            signature: None,
        }
    }

    /// Sets the assertion ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the subject name identifier.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds an attribute statement.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Attaches a signature element.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Removes the issuer element. Used to model malformed peer input.
    #[must_use]
    pub fn without_issuer(mut self) -> Self {
        self.issuer = None;
        self
    }
}

impl SignableMessage for Assertion {
    fn issuer(&self) -> Option<&Issuer> {
        self.issuer.as_ref()
    }

    fn signature(&self) -> Option<&XmlSignature> {
        self.signature.as_ref()
    }
}

/// A single attribute statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates an attribute with one value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_builder() {
        let assertion = Assertion::new("https://idp.example.com")
            .with_id("_a1")
            .with_subject("subject-1")
            .with_attribute(Attribute::new("given_name", "Ada"));

        assert_eq!(assertion.id, "_a1");
        assert_eq!(assertion.subject.as_deref(), Some("subject-1"));
        assert_eq!(assertion.attributes.len(), 1);
        assert!(assertion.signature.is_none());
    }

    #[test]
    fn serde_roundtrip_preserves_identity() {
        let assertion = Assertion::new("https://idp.example.com").with_subject("subject-1");
        let bytes = serde_json::to_vec(&assertion).unwrap();
        let parsed: Assertion = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, assertion);
    }
}
