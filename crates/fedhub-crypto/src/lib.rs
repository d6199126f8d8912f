//! # fedhub-crypto
//!
//! Cryptographic support for the fedhub identity hub using aws-lc-rs.
//!
//! This crate provides:
//!
//! - **Credentials** - usage-tagged key material owned by one counterparty
//! - **Signature verification** - raw-octet verification against a credential
//! - **Certificate chain validation** - leaf-to-trust-store chain checking
//! - **Key transport and AEAD** - RSA-OAEP wrap/unwrap and AES-GCM payloads
//!
//! XML canonicalization and XML-DSig/XML-Enc document processing are not
//! part of this crate; callers hand in the octets those layers produce.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod credential;
pub mod encrypt;
pub mod error;
pub mod verify;

pub use chain::{CertificateChainValidator, ChainValidity, PkixChainValidator, TrustStore};
pub use credential::{Credential, KeyAlgorithm, KeyUsage};
pub use encrypt::{
    aead_open, aead_seal, generate_key, unwrap_key, wrap_key, AeadAlgorithm,
    KeyTransportAlgorithm, SymmetricKey,
};
pub use error::{CryptoError, CryptoResult};
pub use verify::{verify_signature, VerifyAlgorithm};
