//! Core SAML types for the hub's trust/validation layer.
//!
//! These are the in-memory shapes the XML layer produces; no XML parsing
//! or serialization happens in this crate.

pub mod assertion;
pub mod constants;
pub mod encrypted;
pub mod request;
pub mod response;
pub mod status;

pub use assertion::{Assertion, Attribute};
pub use encrypted::{
    CipherData, EncryptedAssertion, EncryptedData, EncryptedKey, EncryptionMethod, KeyInfo,
};
pub use request::AuthnRequest;
pub use response::Response;
pub use status::Status;

use serde::{Deserialize, Serialize};

use crate::signature::XmlSignature;

/// The metadata role a message's signer is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// An identity provider (asserting party).
    IdentityProvider,
    /// A service provider (relying party).
    ServiceProvider,
}

impl Role {
    /// Returns the metadata element name for this role.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::IdentityProvider => "IDPSSODescriptor",
            Self::ServiceProvider => "SPSSODescriptor",
        }
    }
}

/// The issuer of a SAML message.
///
/// An issuer element may be present but carry an empty value; validation
/// distinguishes the two cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// The issuer entity identifier. May be empty.
    pub value: String,
}

impl Issuer {
    /// Creates an issuer with the given entity identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A protocol message that can carry an issuer and an enveloped signature.
///
/// Implemented by responses, assertions and requests so signature trust
/// validation is written once.
pub trait SignableMessage {
    /// Returns the message's issuer element, if present.
    fn issuer(&self) -> Option<&Issuer>;

    /// Returns the message's signature element, if present.
    fn signature(&self) -> Option<&XmlSignature>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_element_names() {
        assert_eq!(Role::IdentityProvider.element_name(), "IDPSSODescriptor");
        assert_eq!(Role::ServiceProvider.element_name(), "SPSSODescriptor");
    }
}
