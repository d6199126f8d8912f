//! Error types for trust anchors and metadata resolution.
//!
//! These errors stay inside the repository: refresh isolates failures per
//! counterparty, and the repository's public surface only ever answers
//! "present" or "absent".

use thiserror::Error;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while fetching, validating and resolving metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A trust anchor failed validation for reasons other than expiry.
    #[error("invalid trust anchor {key_id}: {reasons}")]
    InvalidAnchor {
        /// The anchor's counterparty identifier.
        key_id: String,
        /// The joined validation errors.
        reasons: String,
    },

    /// A trust anchor's certificate has expired.
    ///
    /// Surfaced separately so the repository can fail this anchor alone
    /// and continue with the rest.
    #[error("trust anchor {key_id}: {detail}")]
    AnchorCertificateExpired {
        /// The anchor's counterparty identifier.
        key_id: String,
        /// The expiry detail.
        detail: String,
    },

    /// Certificate bytes could not be decoded.
    #[error("certificate conversion failed: {0}")]
    CertificateConversion(String),

    /// The trust-anchor source or metadata transport failed.
    #[error("metadata fetch failed: {0}")]
    Fetch(String),

    /// A metadata resolver could not be constructed.
    #[error("resolver construction failed: {0}")]
    ResolverConstruction(String),

    /// Every entity in a metadata document was filtered out.
    #[error("metadata filtered out: {0}")]
    FilteredOut(String),
}
