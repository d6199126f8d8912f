//! Signature verification over raw octets.
//!
//! Verifies a detached signature against a credential's public key. The
//! octets to verify are produced by the XML layer (canonicalized
//! `SignedInfo`); this module only performs the cryptographic check.

use aws_lc_rs::signature::{
    self, UnparsedPublicKey, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1,
    ECDSA_P521_SHA512_ASN1, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384,
    RSA_PKCS1_2048_8192_SHA512,
};
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo};

use crate::credential::{Credential, KeyAlgorithm};
use crate::error::{CryptoError, CryptoResult};

/// Verification algorithms accepted for inbound signatures.
///
/// SHA-1 based algorithms are rejected before reaching this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RsaSha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RsaSha512,
    /// ECDSA over P-256 with SHA-256.
    EcdsaSha256,
    /// ECDSA over P-384 with SHA-384.
    EcdsaSha384,
    /// ECDSA over P-521 with SHA-512.
    EcdsaSha512,
}

impl VerifyAlgorithm {
    /// Returns the key algorithm family this verification algorithm needs.
    #[must_use]
    pub const fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 => KeyAlgorithm::Rsa,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => KeyAlgorithm::Ec,
        }
    }
}

/// Verifies `signature` over `data` using the credential's public key.
///
/// Returns `Ok(false)` when the signature simply does not verify; an error
/// is reserved for malformed key material or an algorithm/key mismatch.
///
/// # Errors
///
/// Returns an error if the credential's key cannot be used with the given
/// algorithm.
pub fn verify_signature(
    credential: &Credential,
    data: &[u8],
    sig: &[u8],
    algorithm: VerifyAlgorithm,
) -> CryptoResult<bool> {
    if credential.key_algorithm()? != algorithm.key_algorithm() {
        return Err(CryptoError::UnsupportedAlgorithm(format!(
            "credential key does not match {algorithm:?}"
        )));
    }

    let verification_alg: &dyn signature::VerificationAlgorithm = match algorithm {
        VerifyAlgorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
        VerifyAlgorithm::RsaSha384 => &RSA_PKCS1_2048_8192_SHA384,
        VerifyAlgorithm::RsaSha512 => &RSA_PKCS1_2048_8192_SHA512,
        VerifyAlgorithm::EcdsaSha256 => &ECDSA_P256_SHA256_ASN1,
        VerifyAlgorithm::EcdsaSha384 => &ECDSA_P384_SHA384_ASN1,
        VerifyAlgorithm::EcdsaSha512 => &ECDSA_P521_SHA512_ASN1,
    };

    // The verifier takes the key material inside the SPKI bit string:
    // the PKCS#1 `RSAPublicKey` for RSA, the uncompressed point for EC.
    let key_bytes = spki_key_bytes(credential.public_key_der())?;

    let public_key = UnparsedPublicKey::new(verification_alg, key_bytes);
    match public_key.verify(data, sig) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Extracts the bit-string payload from a `SubjectPublicKeyInfo`.
fn spki_key_bytes(spki_der: &[u8]) -> CryptoResult<Vec<u8>> {
    let (_, spki) = SubjectPublicKeyInfo::from_der(spki_der)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid SubjectPublicKeyInfo: {e}")))?;
    Ok(spki.subject_public_key.data.to_vec())
}
