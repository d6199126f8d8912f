//! Credentials: key material tagged with a usage and an owning entity.
//!
//! A [`Credential`] is immutable once constructed. Trust decisions compare
//! credentials by their certificate (or public key) bytes, so equality of
//! the underlying DER is the membership test for a trusted set.

use serde::{Deserialize, Serialize};
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo, X509Certificate};

use crate::error::{CryptoError, CryptoResult};

/// What a credential's key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyUsage {
    /// The key signs protocol messages and metadata.
    Signing,
    /// The key encrypts assertions and symmetric keys.
    Encryption,
}

impl KeyUsage {
    /// Returns the metadata `use` attribute value for this usage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Signing => "signing",
            Self::Encryption => "encryption",
        }
    }
}

/// The public-key algorithm family of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA keys.
    Rsa,
    /// Elliptic-curve keys.
    Ec,
}

/// An asymmetric key pair or public key owned by one counterparty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    entity_id: String,
    usage: KeyUsage,
    /// `SubjectPublicKeyInfo` DER.
    public_key_der: Vec<u8>,
    /// The certificate the public key was lifted from, when there is one.
    certificate_der: Option<Vec<u8>>,
    /// PKCS#8 DER private key, present only for local credentials.
    private_key_der: Option<Vec<u8>>,
}

impl Credential {
    /// Creates a public-only credential from an X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CertificateConversion`] if the certificate
    /// cannot be decoded.
    pub fn from_certificate_der(
        entity_id: impl Into<String>,
        usage: KeyUsage,
        certificate_der: &[u8],
    ) -> CryptoResult<Self> {
        let (_, certificate) = X509Certificate::from_der(certificate_der)
            .map_err(|e| CryptoError::CertificateConversion(e.to_string()))?;

        Ok(Self {
            entity_id: entity_id.into(),
            usage,
            public_key_der: certificate.public_key().raw.to_vec(),
            certificate_der: Some(certificate_der.to_vec()),
            private_key_der: None,
        })
    }

    /// Creates a public-only credential from `SubjectPublicKeyInfo` DER.
    #[must_use]
    pub fn from_public_key_der(
        entity_id: impl Into<String>,
        usage: KeyUsage,
        public_key_der: Vec<u8>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            usage,
            public_key_der,
            certificate_der: None,
            private_key_der: None,
        }
    }

    /// Attaches a PKCS#8 DER private key, making this a local key pair.
    #[must_use]
    pub fn with_private_key(mut self, private_key_der: Vec<u8>) -> Self {
        self.private_key_der = Some(private_key_der);
        self
    }

    /// Returns the entity identifier that owns this credential.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Returns the usage this credential was issued for.
    #[must_use]
    pub const fn usage(&self) -> KeyUsage {
        self.usage
    }

    /// Returns the `SubjectPublicKeyInfo` DER bytes.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Returns the certificate DER this credential came from, if any.
    #[must_use]
    pub fn certificate_der(&self) -> Option<&[u8]> {
        self.certificate_der.as_deref()
    }

    /// Returns the PKCS#8 DER private key, if this is a local key pair.
    #[must_use]
    pub fn private_key_der(&self) -> Option<&[u8]> {
        self.private_key_der.as_deref()
    }

    /// Determines the key algorithm family from the public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the `SubjectPublicKeyInfo`
    /// cannot be parsed or carries an unrecognized algorithm.
    pub fn key_algorithm(&self) -> CryptoResult<KeyAlgorithm> {
        let (_, spki) = SubjectPublicKeyInfo::from_der(&self.public_key_der)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid SubjectPublicKeyInfo: {e}")))?;

        let oid = &spki.algorithm.algorithm;
        if *oid == x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION {
            Ok(KeyAlgorithm::Rsa)
        } else if *oid == x509_parser::oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY {
            Ok(KeyAlgorithm::Ec)
        } else {
            Err(CryptoError::UnsupportedAlgorithm(format!(
                "unrecognized public key algorithm OID {oid}"
            )))
        }
    }

    /// Returns true if this credential was derived from the given
    /// certificate bytes, or advertises the same public key.
    ///
    /// This is the membership test used when a message advertises its own
    /// signing certificate: the advertised material must match a credential
    /// in the independently resolved trusted set before it is used.
    #[must_use]
    pub fn matches_certificate(&self, certificate_der: &[u8]) -> bool {
        if self.certificate_der.as_deref() == Some(certificate_der) {
            return true;
        }
        X509Certificate::from_der(certificate_der)
            .map(|(_, certificate)| certificate.public_key().raw == self.public_key_der.as_slice())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("entity_id", &self.entity_id)
            .field("usage", &self.usage)
            .field("public_key_len", &self.public_key_der.len())
            .field("has_certificate", &self.certificate_der.is_some())
            .field("has_private_key", &self.private_key_der.is_some())
            .finish()
    }
}
