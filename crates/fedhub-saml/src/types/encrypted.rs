//! Encrypted assertion payload shapes.
//!
//! An encrypted assertion carries its encrypted content plus the wrapped
//! symmetric key(s) needed to open it. Key material may appear in two
//! places: attached directly to the assertion, or nested inside the
//! encrypted data's key info. Both locations must be checked when looking
//! for candidate keys.

use serde::{Deserialize, Serialize};

/// An encrypted SAML assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAssertion {
    /// Identifier of the encrypted element, used in error reporting.
    pub id: String,

    /// The encrypted assertion content.
    pub encrypted_data: EncryptedData,

    /// Wrapped keys attached directly to the assertion (peer placement).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_keys: Vec<EncryptedKey>,
}

impl EncryptedAssertion {
    /// Returns the declared data-encryption algorithm URI, if any.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.encrypted_data
            .encryption_method
            .as_ref()
            .map(|m| m.algorithm.as_str())
    }

    /// Returns the candidate wrapped keys for this assertion.
    ///
    /// The assertion's own key list wins; only when it is empty is the
    /// list nested inside the encrypted data's key info consulted. Returns
    /// an empty slice when neither location has keys.
    #[must_use]
    pub fn candidate_keys(&self) -> &[EncryptedKey] {
        if !self.encrypted_keys.is_empty() {
            return &self.encrypted_keys;
        }
        self.encrypted_data
            .key_info
            .as_ref()
            .map_or(&[], |key_info| key_info.encrypted_keys.as_slice())
    }
}

/// Encrypted content with its algorithm and optional key info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The data-encryption algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<EncryptionMethod>,

    /// Key info nested inside the encrypted data (inline placement).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,

    /// The cipher data.
    pub cipher_data: CipherData,
}

/// Key information carried inside encrypted data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Wrapped symmetric keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_keys: Vec<EncryptedKey>,
}

/// A symmetric key wrapped under a recipient's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKey {
    /// The key-transport algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<EncryptionMethod>,

    /// The wrapped key bytes.
    pub cipher_data: CipherData,
}

impl EncryptedKey {
    /// Returns the declared key-transport algorithm URI, if any.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.encryption_method.as_ref().map(|m| m.algorithm.as_str())
    }
}

/// An encryption algorithm declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMethod {
    /// The algorithm URI.
    pub algorithm: String,

    /// The digest method URI, for OAEP key transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_method: Option<String>,
}

impl EncryptionMethod {
    /// Creates an encryption method for the given algorithm URI.
    #[must_use]
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest_method: None,
        }
    }

    /// Sets the digest method URI.
    #[must_use]
    pub fn with_digest_method(mut self, digest_method: impl Into<String>) -> Self {
        self.digest_method = Some(digest_method.into());
        self
    }
}

/// Base64-encoded cipher bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherData {
    /// The cipher value (base64 encoded).
    pub cipher_value: String,
}

impl CipherData {
    /// Creates cipher data from already-encoded base64.
    #[must_use]
    pub fn new(cipher_value: impl Into<String>) -> Self {
        Self {
            cipher_value: cipher_value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::constants::{encryption_algorithms, key_transport_algorithms};

    fn assertion_with(
        direct: Vec<EncryptedKey>,
        nested: Option<Vec<EncryptedKey>>,
    ) -> EncryptedAssertion {
        EncryptedAssertion {
            id: "_enc1".to_string(),
            encrypted_data: EncryptedData {
                encryption_method: Some(EncryptionMethod::new(encryption_algorithms::AES128_GCM)),
                key_info: nested.map(|encrypted_keys| KeyInfo { encrypted_keys }),
                cipher_data: CipherData::new("AAAA"),
            },
            encrypted_keys: direct,
        }
    }

    fn key() -> EncryptedKey {
        EncryptedKey {
            encryption_method: Some(EncryptionMethod::new(
                key_transport_algorithms::RSA_OAEP_MGF1P,
            )),
            cipher_data: CipherData::new("BBBB"),
        }
    }

    #[test]
    fn direct_keys_take_precedence_over_nested() {
        let assertion = assertion_with(vec![key()], Some(vec![key(), key()]));
        assert_eq!(assertion.candidate_keys().len(), 1);
    }

    #[test]
    fn nested_keys_used_when_direct_list_is_empty() {
        let assertion = assertion_with(Vec::new(), Some(vec![key(), key()]));
        assert_eq!(assertion.candidate_keys().len(), 2);
    }

    #[test]
    fn no_keys_anywhere_yields_empty_candidates() {
        let assertion = assertion_with(Vec::new(), None);
        assert!(assertion.candidate_keys().is_empty());
    }
}
