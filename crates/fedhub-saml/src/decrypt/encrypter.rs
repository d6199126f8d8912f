//! Assertion encryption.
//!
//! The outbound counterpart of the decrypter: serializes an assertion,
//! seals it under a fresh symmetric key and wraps that key for the
//! recipient. The factory carries the algorithm configuration.

use base64::Engine;
use fedhub_crypto::{aead_seal, generate_key, wrap_key, AeadAlgorithm, Credential,
    KeyTransportAlgorithm};

use super::algorithms::{aead_from_uri, key_transport_from_uri};
use crate::error::{SamlError, SamlResult};
use crate::types::constants::{digest_algorithms, encryption_algorithms,
    key_transport_algorithms};
use crate::types::{
    Assertion, CipherData, EncryptedAssertion, EncryptedData, EncryptedKey, EncryptionMethod,
    KeyInfo,
};

/// Where the wrapped key is placed relative to the encrypted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPlacement {
    /// The wrapped key sits next to the encrypted data, attached to the
    /// assertion.
    #[default]
    Peer,
    /// The wrapped key is nested inside the encrypted data's key info.
    Inline,
}

/// Encrypts assertions for a recipient.
#[derive(Debug, Clone)]
pub struct Encrypter {
    data_algorithm: AeadAlgorithm,
    data_algorithm_uri: String,
    key_transport: KeyTransportAlgorithm,
    key_transport_uri: String,
    digest_method: String,
    key_placement: KeyPlacement,
}

impl Encrypter {
    /// Encrypts `assertion` under a fresh symmetric key wrapped for
    /// `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnableToEncrypt`] if sealing fails and
    /// [`SamlError::UnableToEncryptKey`] if the key cannot be wrapped for
    /// the recipient.
    pub fn encrypt_assertion(
        &self,
        assertion: &Assertion,
        recipient: &Credential,
    ) -> SamlResult<EncryptedAssertion> {
        let key = generate_key(self.data_algorithm)
            .map_err(|e| SamlError::UnableToEncrypt(e.to_string()))?;

        let plaintext = serde_json::to_vec(assertion)
            .map_err(|e| SamlError::UnableToEncrypt(format!("serialization failed: {e}")))?;
        let cipher_value = aead_seal(&key, self.data_algorithm, &plaintext)
            .map_err(|e| SamlError::UnableToEncrypt(e.to_string()))?;

        let wrapped = wrap_key(recipient.public_key_der(), self.key_transport, &key).map_err(
            |e| {
                tracing::warn!(entity_id = recipient.entity_id(), error = %e,
                    "failed to wrap assertion key");
                SamlError::UnableToEncryptKey {
                    entity_id: recipient.entity_id().to_string(),
                }
            },
        )?;

        let encrypted_key = EncryptedKey {
            encryption_method: Some(
                EncryptionMethod::new(&self.key_transport_uri)
                    .with_digest_method(&self.digest_method),
            ),
            cipher_data: CipherData::new(
                base64::engine::general_purpose::STANDARD.encode(wrapped),
            ),
        };

        let (direct_keys, key_info) = match self.key_placement {
            KeyPlacement::Peer => (vec![encrypted_key], None),
            KeyPlacement::Inline => (
                Vec::new(),
                Some(KeyInfo {
                    encrypted_keys: vec![encrypted_key],
                }),
            ),
        };

        Ok(EncryptedAssertion {
            id: assertion.id.clone(),
            encrypted_data: EncryptedData {
                encryption_method: Some(EncryptionMethod::new(&self.data_algorithm_uri)),
                key_info,
                cipher_data: CipherData::new(
                    base64::engine::general_purpose::STANDARD.encode(cipher_value),
                ),
            },
            encrypted_keys: direct_keys,
        })
    }
}

/// Builder for [`Encrypter`] instances.
///
/// Defaults to AES-128-GCM data encryption, RSA-OAEP key transport and a
/// SHA-256 OAEP digest, with the wrapped key placed next to the encrypted
/// data.
#[derive(Debug, Clone)]
pub struct EncrypterFactory {
    data_encryption_algorithm: String,
    key_encryption_algorithm: String,
    digest_method: String,
    key_placement: KeyPlacement,
}

impl EncrypterFactory {
    /// Creates a factory with the default algorithm configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the data-encryption algorithm URI.
    #[must_use]
    pub fn with_data_encryption_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.data_encryption_algorithm = algorithm.into();
        self
    }

    /// Overrides the key-transport algorithm URI.
    #[must_use]
    pub fn with_key_encryption_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.key_encryption_algorithm = algorithm.into();
        self
    }

    /// Overrides the OAEP digest method URI.
    #[must_use]
    pub fn with_digest_method(mut self, digest_method: impl Into<String>) -> Self {
        self.digest_method = digest_method.into();
        self
    }

    /// Overrides the key placement.
    #[must_use]
    pub const fn with_key_placement(mut self, key_placement: KeyPlacement) -> Self {
        self.key_placement = key_placement;
        self
    }

    /// Builds an encrypter from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnsupportedAlgorithm`] if a configured URI has
    /// no implementation in this hub.
    pub fn create_encrypter(&self) -> SamlResult<Encrypter> {
        let data_algorithm = aead_from_uri(&self.data_encryption_algorithm).ok_or_else(|| {
            SamlError::UnsupportedAlgorithm(self.data_encryption_algorithm.clone())
        })?;
        let key_transport = key_transport_from_uri(&self.key_encryption_algorithm)
            .ok_or_else(|| SamlError::UnsupportedAlgorithm(self.key_encryption_algorithm.clone()))?;

        Ok(Encrypter {
            data_algorithm,
            data_algorithm_uri: self.data_encryption_algorithm.clone(),
            key_transport,
            key_transport_uri: self.key_encryption_algorithm.clone(),
            digest_method: self.digest_method.clone(),
            key_placement: self.key_placement,
        })
    }
}

impl Default for EncrypterFactory {
    fn default() -> Self {
        Self {
            data_encryption_algorithm: encryption_algorithms::AES128_GCM.to_string(),
            key_encryption_algorithm: key_transport_algorithms::RSA_OAEP_MGF1P.to_string(),
            digest_method: digest_algorithms::SHA256.to_string(),
            key_placement: KeyPlacement::Peer,
        }
    }
}
