//! XML signature support for SAML trust evaluation.
//!
//! Canonicalization and reference processing belong to the XML layer; the
//! shapes here carry the already-canonicalized `SignedInfo` octets plus the
//! signature value and any key material the message advertises about
//! itself.

mod message_validator;
mod trust_engine;

pub use message_validator::{
    CredentialResolverSignatureValidator, MessageSignatureValidator, SignatureValidator,
    SigningCredentialResolver,
};
pub use trust_engine::{ExplicitKeyTrustEngine, MetadataBackedSignatureValidator};

use fedhub_crypto::{KeyAlgorithm, VerifyAlgorithm};
use serde::{Deserialize, Serialize};

use crate::types::constants::{digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
    /// Legacy RSA with SHA-1 (rejected for inbound messages).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::EcdsaSha256 => signature_algorithms::ECDSA_SHA256,
            Self::EcdsaSha384 => signature_algorithms::ECDSA_SHA384,
            Self::EcdsaSha512 => signature_algorithms::ECDSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 | Self::EcdsaSha256 => digest_algorithms::SHA256,
            Self::RsaSha384 | Self::EcdsaSha384 => digest_algorithms::SHA384,
            Self::RsaSha512 | Self::EcdsaSha512 => digest_algorithms::SHA512,
            Self::RsaSha1 => digest_algorithms::SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            signature_algorithms::ECDSA_SHA384 => Some(Self::EcdsaSha384),
            signature_algorithms::ECDSA_SHA512 => Some(Self::EcdsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns the key algorithm family this signature algorithm needs.
    #[must_use]
    pub const fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 | Self::RsaSha1 => {
                KeyAlgorithm::Rsa
            }
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => KeyAlgorithm::Ec,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }

    /// Maps this algorithm to a verification primitive.
    ///
    /// Returns `None` for deprecated algorithms, which are rejected rather
    /// than verified.
    #[must_use]
    pub const fn verify_algorithm(&self) -> Option<VerifyAlgorithm> {
        match self {
            Self::RsaSha256 => Some(VerifyAlgorithm::RsaSha256),
            Self::RsaSha384 => Some(VerifyAlgorithm::RsaSha384),
            Self::RsaSha512 => Some(VerifyAlgorithm::RsaSha512),
            Self::EcdsaSha256 => Some(VerifyAlgorithm::EcdsaSha256),
            Self::EcdsaSha384 => Some(VerifyAlgorithm::EcdsaSha384),
            Self::EcdsaSha512 => Some(VerifyAlgorithm::EcdsaSha512),
            Self::RsaSha1 => None,
        }
    }
}

/// An enveloped XML signature, as produced by the XML layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlSignature {
    /// The signature algorithm declared by the message.
    pub algorithm: SignatureAlgorithm,

    /// The canonicalized `SignedInfo` octets the signature covers.
    pub signed_info: Vec<u8>,

    /// The signature value (base64 encoded). `None` or empty means the
    /// signature element is an unsigned placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_value: Option<String>,

    /// X.509 certificates advertised in the signature's key info
    /// (base64-encoded DER, signing certificate first).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x509_certificates: Vec<String>,
}

impl XmlSignature {
    /// Creates an unsigned signature element over the given octets.
    #[must_use]
    pub fn new(algorithm: SignatureAlgorithm, signed_info: Vec<u8>) -> Self {
        Self {
            algorithm,
            signed_info,
            signature_value: None,
            x509_certificates: Vec::new(),
        }
    }

    /// Sets the base64 signature value.
    #[must_use]
    pub fn with_signature_value(mut self, signature_value: impl Into<String>) -> Self {
        self.signature_value = Some(signature_value.into());
        self
    }

    /// Advertises a certificate (base64 DER) in the signature's key info.
    #[must_use]
    pub fn with_certificate(mut self, certificate_b64: impl Into<String>) -> Self {
        self.x509_certificates.push(certificate_b64.into());
        self
    }

    /// Returns true if the signature element actually carries a signature
    /// value, as opposed to being an unsigned placeholder.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature_value
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_algorithm_uri_roundtrip() {
        for alg in [
            SignatureAlgorithm::RsaSha256,
            SignatureAlgorithm::RsaSha384,
            SignatureAlgorithm::RsaSha512,
            SignatureAlgorithm::EcdsaSha256,
        ] {
            assert_eq!(SignatureAlgorithm::from_uri(alg.uri()), Some(alg));
        }
    }

    #[test]
    fn deprecated_algorithm_has_no_verifier() {
        assert!(SignatureAlgorithm::RsaSha1.is_deprecated());
        assert!(SignatureAlgorithm::RsaSha1.verify_algorithm().is_none());
        assert!(SignatureAlgorithm::RsaSha256.verify_algorithm().is_some());
    }

    #[test]
    fn placeholder_signature_is_not_signed() {
        let unsigned = XmlSignature::new(SignatureAlgorithm::RsaSha256, b"info".to_vec());
        assert!(!unsigned.is_signed());

        let blank = unsigned.clone().with_signature_value("   ");
        assert!(!blank.is_signed());

        let signed = unsigned.with_signature_value("c2ln");
        assert!(signed.is_signed());
    }
}
