//! Trust anchors.
//!
//! A trust anchor is an externally issued, JWK-shaped statement of which
//! certificate chain a counterparty's metadata signature must chain to.
//! Anchors are untrusted input until [`TrustAnchor::find_errors`] has been
//! consulted: the chain may be malformed and any certificate in it may be
//! outside its validity window.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{MetadataError, MetadataResult};

/// A signed trust statement for one counterparty, keyed by entity
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrustAnchor {
    /// The counterparty entity identifier.
    #[serde(rename = "kid")]
    pub key_id: String,

    /// The key type (`RSA` or `EC`).
    #[serde(rename = "kty")]
    pub key_type: String,

    /// The key use; trust anchors must carry `sig`.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// The ordered certificate chain (base64 DER, signing certificate
    /// first).
    #[serde(rename = "x5c", default)]
    pub certificate_chain: Vec<String>,
}

/// A problem found while validating a trust anchor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// The anchor carries no counterparty identifier.
    #[error("trust anchor has no key id")]
    MissingKeyId,

    /// The key type is not one this hub supports.
    #[error("unsupported key type {0}")]
    UnsupportedKeyType(String),

    /// The key use is missing or not `sig`.
    #[error("trust anchor key use must be sig")]
    WrongKeyUse,

    /// The anchor carries no certificate chain.
    #[error("trust anchor has no certificate chain")]
    EmptyCertificateChain,

    /// A chain entry is not a decodable X.509 certificate.
    #[error("X.509 certificate could not be decoded: {0}")]
    UndecodableCertificate(String),

    /// A chain certificate has expired.
    #[error("X.509 certificate has expired ({0})")]
    CertificateExpired(String),

    /// A chain certificate is not yet valid.
    #[error("X.509 certificate is not yet valid ({0})")]
    CertificateNotYetValid(String),
}

/// The trust-anchor document: a JWK set keyed by counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAnchorDocument {
    /// The trust anchors.
    pub keys: Vec<TrustAnchor>,
}

impl TrustAnchorDocument {
    /// Parses a trust-anchor document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Fetch`] when the document is not a
    /// well-formed JWK set.
    pub fn from_json(bytes: &[u8]) -> MetadataResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MetadataError::Fetch(format!("malformed trust anchor document: {e}")))
    }
}

/// A decoded chain certificate with the fields refresh scheduling needs.
#[derive(Debug, Clone)]
pub struct AnchorCertificate {
    /// The certificate DER.
    pub der: Vec<u8>,
    /// The certificate's subject, for logging.
    pub subject: String,
    /// End of the certificate's validity window.
    pub not_after: DateTime<Utc>,
}

impl TrustAnchor {
    /// Creates an anchor for the given counterparty and key type.
    #[must_use]
    pub fn new(key_id: impl Into<String>, key_type: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_type: key_type.into(),
            key_use: Some("sig".to_string()),
            certificate_chain: Vec::new(),
        }
    }

    /// Appends a certificate (base64 DER) to the chain.
    #[must_use]
    pub fn with_certificate(mut self, certificate_b64: impl Into<String>) -> Self {
        self.certificate_chain.push(certificate_b64.into());
        self
    }

    /// Returns the counterparty entity identifier this anchor is keyed by.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.key_id
    }

    /// Validates the anchor, returning every problem found.
    ///
    /// An empty list means the anchor is usable. The expired-certificate
    /// case is a distinct variant because refresh treats it differently
    /// from other anchor defects.
    #[must_use]
    pub fn find_errors(&self) -> Vec<AnchorError> {
        let mut errors = Vec::new();

        if self.key_id.is_empty() {
            errors.push(AnchorError::MissingKeyId);
        }
        if self.key_type != "RSA" && self.key_type != "EC" {
            errors.push(AnchorError::UnsupportedKeyType(self.key_type.clone()));
        }
        if self.key_use.as_deref() != Some("sig") {
            errors.push(AnchorError::WrongKeyUse);
        }
        if self.certificate_chain.is_empty() {
            errors.push(AnchorError::EmptyCertificateChain);
            return errors;
        }

        let now = Utc::now().timestamp();
        for certificate_b64 in &self.certificate_chain {
            let der = match base64::engine::general_purpose::STANDARD.decode(certificate_b64) {
                Ok(der) => der,
                Err(e) => {
                    errors.push(AnchorError::UndecodableCertificate(e.to_string()));
                    continue;
                }
            };
            let certificate = match X509Certificate::from_der(&der) {
                Ok((_, certificate)) => certificate,
                Err(e) => {
                    errors.push(AnchorError::UndecodableCertificate(e.to_string()));
                    continue;
                }
            };

            let subject = certificate.subject().to_string();
            if certificate.validity().not_after.timestamp() < now {
                errors.push(AnchorError::CertificateExpired(subject));
            } else if certificate.validity().not_before.timestamp() > now {
                errors.push(AnchorError::CertificateNotYetValid(subject));
            }
        }

        errors
    }

    /// Decodes the certificate chain as DER, in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CertificateConversion`] if any entry is
    /// not valid base64.
    pub fn certificates_der(&self) -> MetadataResult<Vec<Vec<u8>>> {
        self.certificate_chain
            .iter()
            .map(|certificate_b64| {
                base64::engine::general_purpose::STANDARD
                    .decode(certificate_b64)
                    .map_err(|e| MetadataError::CertificateConversion(e.to_string()))
            })
            .collect()
    }

    /// Decodes the chain and sorts it by expiry, earliest first.
    ///
    /// The earliest-expiring certificate governs the anchor's remaining
    /// lifetime for refresh scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CertificateConversion`] if any certificate
    /// cannot be decoded.
    pub fn certificates_by_expiry(&self) -> MetadataResult<Vec<AnchorCertificate>> {
        let mut certificates = Vec::new();

        for der in self.certificates_der()? {
            let (_, certificate) = X509Certificate::from_der(&der)
                .map_err(|e| MetadataError::CertificateConversion(e.to_string()))?;
            let not_after = DateTime::<Utc>::from_timestamp(
                certificate.validity().not_after.timestamp(),
                0,
            )
            .ok_or_else(|| {
                MetadataError::CertificateConversion(
                    "certificate expiry out of range".to_string(),
                )
            })?;
            certificates.push(AnchorCertificate {
                subject: certificate.subject().to_string(),
                not_after,
                der,
            });
        }

        certificates.sort_by_key(|certificate| certificate.not_after);
        Ok(certificates)
    }
}
