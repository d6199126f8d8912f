//! Validator construction from published trust engines.
//!
//! Ties message validation to the repository's current generation: the
//! factory looks up the trust engine published for a message's issuer and
//! builds the protocol-level validator around it.

use std::sync::Arc;

use crate::error::{SamlError, SamlResult};
use crate::signature::{
    ExplicitKeyTrustEngine, MessageSignatureValidator, MetadataBackedSignatureValidator,
};
use crate::types::{Assertion, Response, Role};
use crate::validated::ValidatedResponse;
use crate::verdict::ValidationVerdict;

/// Source of per-counterparty signature trust engines.
///
/// Implemented by the metadata repository; absence means the counterparty
/// is not currently trusted.
pub trait TrustEngineSource: Send + Sync {
    /// Returns the trust engine published for `entity_id`, if any.
    fn signature_trust_engine(&self, entity_id: &str) -> Option<ExplicitKeyTrustEngine>;
}

/// Builds message validators from the current trust-engine generation.
pub struct ValidatorFactory {
    trust_engines: Arc<dyn TrustEngineSource>,
}

impl ValidatorFactory {
    /// Creates a factory over the given trust-engine source.
    #[must_use]
    pub fn new(trust_engines: Arc<dyn TrustEngineSource>) -> Self {
        Self { trust_engines }
    }

    /// Builds a message validator for the given counterparty.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::NoTrustEngine`] if no trust engine is
    /// published for `entity_id`.
    pub fn message_validator(
        &self,
        entity_id: &str,
    ) -> SamlResult<MessageSignatureValidator<MetadataBackedSignatureValidator>> {
        let trust_engine = self
            .trust_engines
            .signature_trust_engine(entity_id)
            .ok_or_else(|| SamlError::NoTrustEngine {
                entity_id: entity_id.to_string(),
            })?;
        Ok(MessageSignatureValidator::new(
            MetadataBackedSignatureValidator::from_trust_engine(trust_engine),
        ))
    }

    /// Validates a response's signature and returns the validated
    /// container.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::NoTrustEngine`] for an unknown issuer and
    /// [`SamlError::SignatureInvalid`] when validation fails.
    pub fn validated_response(
        &self,
        response: Response,
        role: Role,
    ) -> SamlResult<ValidatedResponse> {
        let issuer_id = response
            .issuer
            .as_ref()
            .map(|issuer| issuer.value.clone())
            .unwrap_or_default();
        let validator = self.message_validator(&issuer_id)?;

        match validator.validate(&response, role) {
            ValidationVerdict::Valid => Ok(ValidatedResponse::new(response)),
            ValidationVerdict::Invalid { reason, .. } => Err(SamlError::SignatureInvalid {
                reason: reason.message().to_string(),
            }),
        }
    }

    /// Validates decrypted cross-border assertions against the response
    /// issuer's trust engine, accepting unsigned assertions by policy.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SignatureInvalid`] for the first assertion
    /// that fails validation.
    pub fn validate_country_assertions(
        &self,
        validated_response: &ValidatedResponse,
        assertions: &[Assertion],
        role: Role,
    ) -> SamlResult<()> {
        let issuer_id = validated_response
            .issuer()
            .map(|issuer| issuer.value.clone())
            .unwrap_or_default();
        let validator = self.message_validator(&issuer_id)?;

        for assertion in assertions {
            if let ValidationVerdict::Invalid { reason, .. } =
                validator.validate_country_assertion(assertion, role)
            {
                return Err(SamlError::SignatureInvalid {
                    reason: reason.message().to_string(),
                });
            }
        }
        Ok(())
    }
}
