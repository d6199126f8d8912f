//! # fedhub-saml
//!
//! SAML trust evaluation and assertion decryption for the fedhub identity
//! hub. This crate decides whether an inbound protocol message is backed
//! by a trusted credential, and opens (or re-wraps for relay) the
//! encrypted identity data it carries:
//!
//! - **Signature trust validation** - issuer and signature policy checks
//!   over a two-phase explicit-key trust engine
//! - **Assertion decryption** - allow-listed algorithms, batch decryption,
//!   and symmetric-key re-encryption for relay
//! - **Validated containers** - decryption only accepts responses that
//!   have passed signature validation
//!
//! XML parsing, canonicalization and transport are external: this crate
//! works on the in-memory shapes the XML layer produces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decrypt;
pub mod error;
pub mod factory;
pub mod signature;
pub mod types;
pub mod validated;
pub mod verdict;

pub use decrypt::{
    AssertionDecrypter, Decrypter, Encrypter, EncrypterFactory, EncryptionAlgorithmValidator,
    EncryptionCredentialResolver, KeyPlacement, SecretKeyEncrypter,
};
pub use error::{SamlError, SamlResult};
pub use factory::{TrustEngineSource, ValidatorFactory};
pub use signature::{
    CredentialResolverSignatureValidator, ExplicitKeyTrustEngine, MessageSignatureValidator,
    MetadataBackedSignatureValidator, SignatureAlgorithm, SignatureValidator,
    SigningCredentialResolver, XmlSignature,
};
pub use types::{
    Assertion, Attribute, AuthnRequest, CipherData, EncryptedAssertion, EncryptedData,
    EncryptedKey, EncryptionMethod, Issuer, KeyInfo, Response, Role, SignableMessage, Status,
};
pub use validated::ValidatedResponse;
pub use verdict::{ValidationReason, ValidationVerdict};
