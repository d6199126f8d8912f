//! Explicit-key signature trust evaluation.
//!
//! Trust rests on the independently resolved trusted credentials, never on
//! what a message claims about itself: key material advertised inside a
//! signature is only used after it has been matched to a credential in the
//! trusted set.

use std::sync::Arc;

use base64::Engine;
use fedhub_core::metrics::{SignatureMetrics, VERIFICATION_FAILED};
use fedhub_crypto::{verify_signature, Credential, CryptoError, KeyUsage};

use super::message_validator::SignatureValidator;
use super::XmlSignature;
use crate::types::Role;

/// Trust engine holding the trusted signing credentials for one
/// counterparty.
///
/// Verification is two-phase: first the credentials the signature
/// advertises about itself (cross-checked against the trusted set), then a
/// fallback pass over the trusted credentials directly. Every failed
/// fallback candidate is reported to the metrics port.
#[derive(Clone)]
pub struct ExplicitKeyTrustEngine {
    trusted_credentials: Vec<Credential>,
    metrics: Arc<dyn SignatureMetrics>,
}

impl ExplicitKeyTrustEngine {
    /// Creates a trust engine over the given trusted credentials.
    #[must_use]
    pub fn new(trusted_credentials: Vec<Credential>, metrics: Arc<dyn SignatureMetrics>) -> Self {
        Self {
            trusted_credentials,
            metrics,
        }
    }

    /// Returns the trusted credentials this engine was built from.
    #[must_use]
    pub fn trusted_credentials(&self) -> &[Credential] {
        &self.trusted_credentials
    }

    /// Decides whether the signature verifies against a trusted credential.
    ///
    /// Returns `Ok(false)` when no candidate establishes trust; errors are
    /// reserved for internal failures (undecodable signature value,
    /// unusable key material, deprecated algorithm).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] on internal verification failures.
    pub fn validate(&self, signature: &XmlSignature) -> Result<bool, CryptoError> {
        if !signature.is_signed() {
            return Ok(false);
        }

        let Some(algorithm) = signature.algorithm.verify_algorithm() else {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "deprecated signature algorithm {}",
                signature.algorithm.uri()
            )));
        };

        let signature_value: String = signature
            .signature_value
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let sig_bytes = base64::engine::general_purpose::STANDARD
            .decode(&signature_value)
            .map_err(|e| CryptoError::Verification(format!("invalid signature encoding: {e}")))?;

        // Trusted credentials resolved for this signature: signing usage,
        // matching key algorithm family.
        let candidates: Vec<&Credential> = self
            .trusted_credentials
            .iter()
            .filter(|c| c.usage() == KeyUsage::Signing)
            .filter(|c| {
                c.key_algorithm()
                    .map(|k| k == algorithm.key_algorithm())
                    .unwrap_or(false)
            })
            .collect();

        // First pass: credentials the signature advertises about itself,
        // trusted only if they match a credential in the resolved set.
        for certificate_b64 in &signature.x509_certificates {
            let Ok(certificate_der) =
                base64::engine::general_purpose::STANDARD.decode(certificate_b64.trim())
            else {
                tracing::debug!("skipping undecodable advertised certificate");
                continue;
            };
            let Some(advertised) = candidates
                .iter()
                .find(|c| c.matches_certificate(&certificate_der))
            else {
                continue;
            };
            if verify_signature(advertised, &signature.signed_info, &sig_bytes, algorithm)? {
                return Ok(true);
            }
        }

        // Fallback: attempt the trusted credentials directly.
        tracing::debug!("attempting to verify signature using trusted credentials");
        for credential in &candidates {
            if verify_signature(credential, &signature.signed_info, &sig_bytes, algorithm)? {
                tracing::debug!("successfully verified signature using resolved trusted credential");
                return Ok(true);
            }
            self.metrics.verification_failure(VERIFICATION_FAILED);
            tracing::warn!("failed to verify signature using trusted credentials");
        }

        tracing::debug!(
            "failed to verify signature using either advertised or directly trusted credentials"
        );
        Ok(false)
    }
}

impl std::fmt::Debug for ExplicitKeyTrustEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplicitKeyTrustEngine")
            .field("trusted_credentials", &self.trusted_credentials.len())
            .finish()
    }
}

/// Signature validator backed by a prebuilt trust engine.
///
/// Used when the trust engine for a counterparty has already been
/// resolved, typically out of the metadata repository's published map.
#[derive(Debug, Clone)]
pub struct MetadataBackedSignatureValidator {
    trust_engine: ExplicitKeyTrustEngine,
}

impl MetadataBackedSignatureValidator {
    /// Creates a validator from a resolved trust engine.
    #[must_use]
    pub fn from_trust_engine(trust_engine: ExplicitKeyTrustEngine) -> Self {
        Self { trust_engine }
    }
}

impl SignatureValidator for MetadataBackedSignatureValidator {
    fn validate(
        &self,
        signature: &XmlSignature,
        _issuer_id: &str,
        _role: Role,
    ) -> Result<bool, CryptoError> {
        self.trust_engine.validate(signature)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use aws_lc_rs::encoding::AsDer;
    use aws_lc_rs::rand::SystemRandom;
    use aws_lc_rs::rsa::{KeySize, PrivateDecryptingKey};
    use aws_lc_rs::signature::{RsaKeyPair, RSA_PKCS1_SHA256};

    use super::*;
    use crate::signature::SignatureAlgorithm;

    #[derive(Default)]
    struct CountingMetrics {
        failures: AtomicUsize,
    }

    impl SignatureMetrics for CountingMetrics {
        fn verification_failure(&self, error_type: &str) {
            assert_eq!(error_type, VERIFICATION_FAILED);
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestKey {
        pkcs8: Vec<u8>,
        spki: Vec<u8>,
    }

    fn generate_rsa_key() -> TestKey {
        let private = PrivateDecryptingKey::generate(KeySize::Rsa2048).unwrap();
        let pkcs8 = private.as_der().unwrap().as_ref().to_vec();
        let public = private.public_key();
        let spki = public.as_der().unwrap().as_ref().to_vec();
        TestKey { pkcs8, spki }
    }

    fn rsa_sign(pkcs8: &[u8], data: &[u8]) -> Vec<u8> {
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8).unwrap();
        let mut sig = vec![0u8; key_pair.public_modulus_len()];
        key_pair
            .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), data, &mut sig)
            .unwrap();
        sig
    }

    fn signed_xml_signature(pkcs8: &[u8]) -> XmlSignature {
        let signed_info = b"canonical-signed-info".to_vec();
        let sig = rsa_sign(pkcs8, &signed_info);
        XmlSignature::new(SignatureAlgorithm::RsaSha256, signed_info)
            .with_signature_value(base64::engine::general_purpose::STANDARD.encode(sig))
    }

    #[test]
    fn trusted_credential_verifies_signature() {
        let key = generate_rsa_key();
        let credential = Credential::from_public_key_der(
            "https://idp.example.com",
            KeyUsage::Signing,
            key.spki.clone(),
        );
        let metrics = Arc::new(CountingMetrics::default());
        let engine = ExplicitKeyTrustEngine::new(vec![credential], metrics.clone());

        let signature = signed_xml_signature(&key.pkcs8);
        assert!(engine.validate(&signature).unwrap());
        assert_eq!(metrics.failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn untrusted_signer_fails_and_counts_each_candidate() {
        let trusted_one = generate_rsa_key();
        let trusted_two = generate_rsa_key();
        let attacker = generate_rsa_key();

        let metrics = Arc::new(CountingMetrics::default());
        let engine = ExplicitKeyTrustEngine::new(
            vec![
                Credential::from_public_key_der("idp", KeyUsage::Signing, trusted_one.spki),
                Credential::from_public_key_der("idp", KeyUsage::Signing, trusted_two.spki),
            ],
            metrics.clone(),
        );

        let signature = signed_xml_signature(&attacker.pkcs8);
        assert!(!engine.validate(&signature).unwrap());
        assert_eq!(metrics.failures.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn encryption_credentials_are_not_verification_candidates() {
        let key = generate_rsa_key();
        let metrics = Arc::new(CountingMetrics::default());
        let engine = ExplicitKeyTrustEngine::new(
            vec![Credential::from_public_key_der(
                "idp",
                KeyUsage::Encryption,
                key.spki.clone(),
            )],
            metrics.clone(),
        );

        let signature = signed_xml_signature(&key.pkcs8);
        assert!(!engine.validate(&signature).unwrap());
        // Not a candidate, so not counted as a failed verification attempt.
        assert_eq!(metrics.failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn advertised_certificate_verifies_when_in_trusted_set() {
        use aws_lc_rs::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

        let key_pair = rcgen::KeyPair::generate().unwrap();
        let params =
            rcgen::CertificateParams::new(vec!["counterparty.example.com".to_string()]).unwrap();
        let certificate = params.self_signed(&key_pair).unwrap();
        let certificate_der = certificate.der().to_vec();

        let signing_key =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &key_pair.serialize_der())
                .unwrap();
        let signed_info = b"canonical-signed-info".to_vec();
        let sig = signing_key
            .sign(&SystemRandom::new(), &signed_info)
            .unwrap();

        let credential =
            Credential::from_certificate_der("idp", KeyUsage::Signing, &certificate_der).unwrap();
        let metrics = Arc::new(CountingMetrics::default());
        let engine = ExplicitKeyTrustEngine::new(vec![credential], metrics.clone());

        let signature = XmlSignature::new(SignatureAlgorithm::EcdsaSha256, signed_info)
            .with_signature_value(
                base64::engine::general_purpose::STANDARD.encode(sig.as_ref()),
            )
            .with_certificate(
                base64::engine::general_purpose::STANDARD.encode(&certificate_der),
            );

        assert!(engine.validate(&signature).unwrap());
        assert_eq!(metrics.failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deprecated_algorithm_is_an_internal_error() {
        let key = generate_rsa_key();
        let engine = ExplicitKeyTrustEngine::new(
            vec![Credential::from_public_key_der("idp", KeyUsage::Signing, key.spki)],
            Arc::new(CountingMetrics::default()),
        );

        let signature = XmlSignature::new(SignatureAlgorithm::RsaSha1, b"info".to_vec())
            .with_signature_value("c2ln");
        assert!(engine.validate(&signature).is_err());
    }
}
