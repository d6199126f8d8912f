//! Error types for SAML trust evaluation and decryption.
//!
//! Expected validation outcomes (missing issuer, untrusted signature and so
//! on) are *not* errors; they are returned as
//! [`ValidationVerdict`](crate::verdict::ValidationVerdict) values. The
//! errors here are fatal: a message that triggers one must be rejected as a
//! whole.

use thiserror::Error;

/// Result type for SAML security operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Fatal errors from assertion decryption, key handling and validator
/// construction.
#[derive(Debug, Error)]
pub enum SamlError {
    /// An encrypted assertion could not be decrypted.
    #[error("problem decrypting assertion {assertion_id}: {cause}")]
    UnableToDecrypt {
        /// ID of the assertion that failed.
        assertion_id: String,
        /// Underlying cause, for logging.
        cause: String,
    },

    /// No candidate encrypted key for an assertion could be unwrapped.
    #[error("unable to decrypt XML encryption key using algorithm {algorithm}")]
    UnableToDecryptKey {
        /// The algorithm of the last candidate key attempted.
        algorithm: String,
    },

    /// An assertion carries no encrypted key in either permitted location.
    #[error("unable to locate encrypted key")]
    UnableToLocateEncryptedKey,

    /// The declared encryption algorithm is not on the allow-list.
    #[error("encryption algorithm not permitted: {algorithm}")]
    DisallowedAlgorithm {
        /// The offending algorithm URI, or `(none)` if absent.
        algorithm: String,
    },

    /// A symmetric key could not be re-wrapped for a recipient.
    #[error("unable to encrypt XML encryption key for entity {entity_id}")]
    UnableToEncryptKey {
        /// The intended recipient.
        entity_id: String,
    },

    /// An assertion could not be encrypted.
    #[error("unable to encrypt assertion: {0}")]
    UnableToEncrypt(String),

    /// An algorithm URI is not supported by this hub.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),

    /// No signature trust engine is published for the entity.
    #[error("unable to find metadata resolver for entity {entity_id}")]
    NoTrustEngine {
        /// The unknown entity identifier.
        entity_id: String,
    },

    /// A message failed signature validation where a validated message was
    /// required.
    #[error("message signature rejected: {reason}")]
    SignatureInvalid {
        /// The verdict reason, rendered for the caller.
        reason: String,
    },
}
