//! Certificate chain validation against a trust store.
//!
//! Federation metadata is attacker-influenced until every certificate in it
//! has been chained back to a trust store. The validator here checks the
//! leaf's validity window and walks its issuer into the store; metadata
//! filtering drops anything that does not validate.

use chrono::Utc;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{CryptoError, CryptoResult};

/// An in-memory set of trusted DER certificates.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Vec<u8>>,
}

impl TrustStore {
    /// Creates an empty trust store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trust store holding the given DER certificates.
    #[must_use]
    pub fn from_certificates(certificates: Vec<Vec<u8>>) -> Self {
        Self { certificates }
    }

    /// Adds a DER certificate to the store.
    pub fn add_certificate(&mut self, certificate_der: Vec<u8>) {
        self.certificates.push(certificate_der);
    }

    /// Returns true if the exact certificate bytes are in the store.
    #[must_use]
    pub fn contains(&self, certificate_der: &[u8]) -> bool {
        self.certificates.iter().any(|c| c == certificate_der)
    }

    /// Returns the stored certificates.
    #[must_use]
    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    /// Returns true if the store holds no certificates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

/// Outcome of validating one certificate against a trust store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainValidity {
    /// The certificate chains to the trust store and is within its
    /// validity window.
    Valid,
    /// The certificate does not validate; the reason is for logging only.
    Invalid {
        /// Human-readable reason for the failure.
        reason: String,
    },
}

impl ChainValidity {
    /// Returns true for [`ChainValidity::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Decides whether a certificate is backed by a trust store.
pub trait CertificateChainValidator: Send + Sync {
    /// Validates `certificate_der` against `trust_store`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CertificateConversion`] if the certificate
    /// bytes cannot be decoded at all. A decodable certificate that fails
    /// validation is reported through [`ChainValidity::Invalid`].
    fn validate(
        &self,
        certificate_der: &[u8],
        trust_store: &TrustStore,
    ) -> CryptoResult<ChainValidity>;
}

/// Chain validator checking validity windows and issuer linkage.
///
/// A certificate is accepted when it is inside its validity window and
/// either appears in the trust store verbatim or is signed by a store
/// certificate (matched by issuer/subject name, signature verified).
#[derive(Debug, Clone, Copy, Default)]
pub struct PkixChainValidator;

impl PkixChainValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CertificateChainValidator for PkixChainValidator {
    fn validate(
        &self,
        certificate_der: &[u8],
        trust_store: &TrustStore,
    ) -> CryptoResult<ChainValidity> {
        let (_, leaf) = X509Certificate::from_der(certificate_der)
            .map_err(|e| CryptoError::CertificateConversion(e.to_string()))?;

        let now = Utc::now().timestamp();
        if leaf.validity().not_before.timestamp() > now {
            return Ok(ChainValidity::invalid("certificate is not yet valid"));
        }
        if leaf.validity().not_after.timestamp() < now {
            return Ok(ChainValidity::invalid("certificate has expired"));
        }

        if trust_store.contains(certificate_der) {
            return Ok(ChainValidity::Valid);
        }

        for anchor_der in trust_store.certificates() {
            let Ok((_, anchor)) = X509Certificate::from_der(anchor_der) else {
                continue;
            };
            if anchor.subject() != leaf.issuer() {
                continue;
            }
            if anchor.validity().not_after.timestamp() < now {
                return Ok(ChainValidity::invalid("issuing certificate has expired"));
            }
            if leaf.verify_signature(Some(anchor.public_key())).is_ok() {
                return Ok(ChainValidity::Valid);
            }
            return Ok(ChainValidity::invalid(
                "certificate signature does not chain to the trust store",
            ));
        }

        Ok(ChainValidity::invalid("no issuer found in the trust store"))
    }
}
