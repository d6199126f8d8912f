//! Encryption algorithm allow-listing.
//!
//! The declared algorithm of an encrypted assertion is checked against an
//! allow-list before any cryptographic work happens. Rejecting unapproved
//! algorithms up front closes off algorithm-confusion attacks where a peer
//! declares a weak or unexpected cipher.

use std::collections::HashSet;

use fedhub_crypto::{AeadAlgorithm, KeyTransportAlgorithm};

use crate::error::{SamlError, SamlResult};
use crate::types::constants::{encryption_algorithms, key_transport_algorithms};
use crate::types::EncryptedAssertion;

/// Maps a data-encryption algorithm URI to an AEAD primitive.
pub(crate) fn aead_from_uri(uri: &str) -> Option<AeadAlgorithm> {
    match uri {
        encryption_algorithms::AES128_GCM => Some(AeadAlgorithm::Aes128Gcm),
        encryption_algorithms::AES256_GCM => Some(AeadAlgorithm::Aes256Gcm),
        _ => None,
    }
}

/// Maps a key-transport algorithm URI to a wrap primitive.
pub(crate) fn key_transport_from_uri(uri: &str) -> Option<KeyTransportAlgorithm> {
    match uri {
        key_transport_algorithms::RSA_OAEP_MGF1P => Some(KeyTransportAlgorithm::RsaOaepSha1),
        key_transport_algorithms::RSA_OAEP => Some(KeyTransportAlgorithm::RsaOaepSha256),
        _ => None,
    }
}

/// Allow-list validator for declared encryption algorithms.
#[derive(Debug, Clone)]
pub struct EncryptionAlgorithmValidator {
    data_algorithms: HashSet<String>,
    key_transport_algorithms: HashSet<String>,
}

impl EncryptionAlgorithmValidator {
    /// Creates a validator with explicit allow-lists.
    #[must_use]
    pub fn new(
        data_algorithms: impl IntoIterator<Item = String>,
        key_transport_algorithms: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            data_algorithms: data_algorithms.into_iter().collect(),
            key_transport_algorithms: key_transport_algorithms.into_iter().collect(),
        }
    }

    /// Validates the declared algorithms of an encrypted assertion.
    ///
    /// Checks the data-encryption algorithm and the key-transport algorithm
    /// of every candidate key. Runs before any key unwrap or decryption is
    /// attempted.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::DisallowedAlgorithm`] naming the first
    /// algorithm that is missing or not on the allow-list.
    pub fn validate(&self, encrypted_assertion: &EncryptedAssertion) -> SamlResult<()> {
        let data_algorithm = encrypted_assertion.algorithm().unwrap_or("(none)");
        if !self.data_algorithms.contains(data_algorithm) {
            return Err(SamlError::DisallowedAlgorithm {
                algorithm: data_algorithm.to_string(),
            });
        }

        for encrypted_key in encrypted_assertion.candidate_keys() {
            let transport = encrypted_key.algorithm().unwrap_or("(none)");
            if !self.key_transport_algorithms.contains(transport) {
                return Err(SamlError::DisallowedAlgorithm {
                    algorithm: transport.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for EncryptionAlgorithmValidator {
    /// Allows AES-GCM data encryption and RSA-OAEP key transport only.
    fn default() -> Self {
        Self::new(
            [
                encryption_algorithms::AES128_GCM.to_string(),
                encryption_algorithms::AES256_GCM.to_string(),
            ],
            [
                key_transport_algorithms::RSA_OAEP_MGF1P.to_string(),
                key_transport_algorithms::RSA_OAEP.to_string(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CipherData, EncryptedData, EncryptionMethod};

    fn assertion_with_algorithm(algorithm: Option<&str>) -> EncryptedAssertion {
        EncryptedAssertion {
            id: "_enc1".to_string(),
            encrypted_data: EncryptedData {
                encryption_method: algorithm.map(EncryptionMethod::new),
                key_info: None,
                cipher_data: CipherData::new("AAAA"),
            },
            encrypted_keys: Vec::new(),
        }
    }

    #[test]
    fn gcm_algorithms_are_allowed_by_default() {
        let validator = EncryptionAlgorithmValidator::default();
        let assertion = assertion_with_algorithm(Some(encryption_algorithms::AES128_GCM));
        assert!(validator.validate(&assertion).is_ok());
    }

    #[test]
    fn cbc_is_rejected_by_default() {
        let validator = EncryptionAlgorithmValidator::default();
        let assertion = assertion_with_algorithm(Some(encryption_algorithms::AES128_CBC));
        let result = validator.validate(&assertion);
        assert!(
            matches!(result, Err(SamlError::DisallowedAlgorithm { algorithm }) if algorithm.contains("cbc"))
        );
    }

    #[test]
    fn missing_algorithm_is_rejected() {
        let validator = EncryptionAlgorithmValidator::default();
        let assertion = assertion_with_algorithm(None);
        assert!(matches!(
            validator.validate(&assertion),
            Err(SamlError::DisallowedAlgorithm { .. })
        ));
    }

    #[test]
    fn rsa15_key_transport_is_rejected() {
        let validator = EncryptionAlgorithmValidator::default();
        let mut assertion = assertion_with_algorithm(Some(encryption_algorithms::AES128_GCM));
        assertion.encrypted_keys.push(crate::types::EncryptedKey {
            encryption_method: Some(EncryptionMethod::new(key_transport_algorithms::RSA_1_5)),
            cipher_data: CipherData::new("BBBB"),
        });

        assert!(matches!(
            validator.validate(&assertion),
            Err(SamlError::DisallowedAlgorithm { .. })
        ));
    }
}
