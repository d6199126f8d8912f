//! Error types for cryptographic operations.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by credential handling and cryptographic primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A private or public key could not be parsed or used.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// An X.509 certificate could not be decoded.
    ///
    /// Distinct from a certificate that parses but fails chain validation;
    /// metadata filtering treats this as fatal for the whole pass.
    #[error("certificate conversion failed: {0}")]
    CertificateConversion(String),

    /// The requested algorithm is not supported by this build.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),

    /// An internal error occurred during signature verification.
    ///
    /// A signature that simply does not verify is reported as `Ok(false)`,
    /// not as this error.
    #[error("signature verification error: {0}")]
    Verification(String),

    /// A symmetric key could not be wrapped for a recipient.
    #[error("key wrap failed: {0}")]
    Wrap(String),

    /// A wrapped symmetric key could not be unwrapped.
    #[error("key unwrap failed: {0}")]
    Unwrap(String),

    /// An encrypted payload could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A payload could not be encrypted.
    #[error("encryption failed: {0}")]
    Encryption(String),
}
