//! Protocol-level signature trust validation.
//!
//! The policy layer over the trust engine: a message must name its issuer,
//! carry a signature, and the signature must verify against a credential
//! trusted for that issuer and role. Every expected failure is a verdict,
//! never an error.

use std::sync::Arc;

use fedhub_core::metrics::SignatureMetrics;
use fedhub_crypto::{Credential, CryptoError};

use super::trust_engine::ExplicitKeyTrustEngine;
use super::XmlSignature;
use crate::types::{Assertion, Issuer, Role, SignableMessage};
use crate::verdict::{ValidationReason, ValidationVerdict};

/// Decides whether a signature verifies for a given issuer and role.
pub trait SignatureValidator: Send + Sync {
    /// Verifies `signature` for the given issuer and expected signer role.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] on internal verification failures; a
    /// signature that simply does not verify is `Ok(false)`.
    fn validate(
        &self,
        signature: &XmlSignature,
        issuer_id: &str,
        role: Role,
    ) -> Result<bool, CryptoError>;
}

/// Resolves the trusted signing credentials for a counterparty and role.
pub trait SigningCredentialResolver: Send + Sync {
    /// Returns the credentials trusted to sign for `entity_id` in `role`.
    fn verifying_credentials(&self, entity_id: &str, role: Role) -> Vec<Credential>;
}

/// Signature validator that resolves trusted credentials per message.
///
/// Builds an [`ExplicitKeyTrustEngine`] from the resolver's answer for the
/// message's issuer, so the two-phase verification logic is written once.
pub struct CredentialResolverSignatureValidator {
    resolver: Arc<dyn SigningCredentialResolver>,
    metrics: Arc<dyn SignatureMetrics>,
}

impl CredentialResolverSignatureValidator {
    /// Creates a validator over the given credential resolver.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn SigningCredentialResolver>,
        metrics: Arc<dyn SignatureMetrics>,
    ) -> Self {
        Self { resolver, metrics }
    }
}

impl SignatureValidator for CredentialResolverSignatureValidator {
    fn validate(
        &self,
        signature: &XmlSignature,
        issuer_id: &str,
        role: Role,
    ) -> Result<bool, CryptoError> {
        let credentials = self.resolver.verifying_credentials(issuer_id, role);
        ExplicitKeyTrustEngine::new(credentials, self.metrics.clone()).validate(signature)
    }
}

/// Protocol-level signature trust validation for SAML messages.
pub struct MessageSignatureValidator<V> {
    signature_validator: V,
}

impl<V: SignatureValidator> MessageSignatureValidator<V> {
    /// Creates a message validator delegating to `signature_validator`.
    #[must_use]
    pub fn new(signature_validator: V) -> Self {
        Self {
            signature_validator,
        }
    }

    /// Validates the signature on a response, assertion or request.
    pub fn validate<M: SignableMessage>(&self, message: &M, role: Role) -> ValidationVerdict {
        match validate_issuer(message.issuer()) {
            IssuerCheck::Invalid(verdict) => verdict,
            IssuerCheck::Ok(issuer_id) => self.validate_signature(message, &issuer_id, role),
        }
    }

    /// Validates a cross-border assertion, where an absent signature is
    /// accepted by policy (the enclosing envelope protects it).
    ///
    /// This exemption is an explicit opt-in per call; the regular
    /// [`validate`](Self::validate) path treats a missing signature as
    /// invalid.
    pub fn validate_country_assertion(
        &self,
        assertion: &Assertion,
        role: Role,
    ) -> ValidationVerdict {
        match validate_issuer(assertion.issuer.as_ref()) {
            IssuerCheck::Invalid(verdict) => verdict,
            IssuerCheck::Ok(issuer_id) => {
                if assertion.signature.is_none() {
                    return ValidationVerdict::Valid;
                }
                self.validate_signature(assertion, &issuer_id, role)
            }
        }
    }

    fn validate_signature<M: SignableMessage>(
        &self,
        message: &M,
        issuer_id: &str,
        role: Role,
    ) -> ValidationVerdict {
        let Some(signature) = message.signature() else {
            return ValidationVerdict::invalid(ValidationReason::MissingSignature);
        };
        if !signature.is_signed() {
            return ValidationVerdict::invalid(ValidationReason::SignatureNotSigned);
        }

        match self.signature_validator.validate(signature, issuer_id, role) {
            Ok(true) => ValidationVerdict::Valid,
            Ok(false) => ValidationVerdict::invalid(ValidationReason::InvalidSignature),
            Err(e) => {
                tracing::warn!(
                    issuer = issuer_id,
                    error = %e,
                    "unexpected error validating the message signature"
                );
                ValidationVerdict::invalid_with_cause(
                    ValidationReason::UnableToValidate,
                    e.to_string(),
                )
            }
        }
    }
}

enum IssuerCheck {
    Ok(String),
    Invalid(ValidationVerdict),
}

fn validate_issuer(issuer: Option<&Issuer>) -> IssuerCheck {
    match issuer {
        None => IssuerCheck::Invalid(ValidationVerdict::invalid(ValidationReason::MissingIssuer)),
        Some(issuer) if issuer.value.is_empty() => {
            IssuerCheck::Invalid(ValidationVerdict::invalid(ValidationReason::EmptyIssuer))
        }
        Some(issuer) => IssuerCheck::Ok(issuer.value.clone()),
    }
}
