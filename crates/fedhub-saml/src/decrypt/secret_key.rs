//! Re-wrapping symmetric keys for a different recipient.

use std::sync::Arc;

use base64::Engine;
use fedhub_crypto::{wrap_key, Credential, KeyTransportAlgorithm, SymmetricKey};

use crate::error::{SamlError, SamlResult};

/// Resolves the encrypting credential published for a counterparty.
pub trait EncryptionCredentialResolver: Send + Sync {
    /// Returns the credential to encrypt for `entity_id`, if known.
    fn encrypting_credential(&self, entity_id: &str) -> Option<Credential>;
}

/// Wraps an unwrapped symmetric key under a target entity's public key.
///
/// Used when relaying encrypted content: the symmetric key is unwrapped
/// with the hub's private key and immediately re-wrapped for the final
/// recipient, so the relayed assertion itself is never decrypted here.
pub struct SecretKeyEncrypter {
    credential_resolver: Arc<dyn EncryptionCredentialResolver>,
    key_transport: KeyTransportAlgorithm,
}

impl SecretKeyEncrypter {
    /// Creates an encrypter resolving recipients through `credential_resolver`.
    #[must_use]
    pub fn new(credential_resolver: Arc<dyn EncryptionCredentialResolver>) -> Self {
        Self {
            credential_resolver,
            key_transport: KeyTransportAlgorithm::RsaOaepSha1,
        }
    }

    /// Overrides the key-transport algorithm used for re-wrapping.
    #[must_use]
    pub fn with_key_transport(mut self, key_transport: KeyTransportAlgorithm) -> Self {
        self.key_transport = key_transport;
        self
    }

    /// Wraps `key` under the encrypting credential of `entity_id`.
    ///
    /// Returns the wrapped key as base64.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnableToEncryptKey`] if the entity has no
    /// encrypting credential or wrapping fails.
    pub fn encrypt_key_for_entity(
        &self,
        key: &SymmetricKey,
        entity_id: &str,
    ) -> SamlResult<String> {
        let credential = self
            .credential_resolver
            .encrypting_credential(entity_id)
            .ok_or_else(|| SamlError::UnableToEncryptKey {
                entity_id: entity_id.to_string(),
            })?;

        let wrapped = wrap_key(credential.public_key_der(), self.key_transport, key).map_err(
            |e| {
                tracing::warn!(entity_id, error = %e, "failed to wrap symmetric key");
                SamlError::UnableToEncryptKey {
                    entity_id: entity_id.to_string(),
                }
            },
        )?;

        Ok(base64::engine::general_purpose::STANDARD.encode(wrapped))
    }
}

#[cfg(test)]
mod tests {
    use fedhub_crypto::{generate_key, AeadAlgorithm};

    use super::*;

    struct EmptyResolver;

    impl EncryptionCredentialResolver for EmptyResolver {
        fn encrypting_credential(&self, _entity_id: &str) -> Option<Credential> {
            None
        }
    }

    #[test]
    fn unknown_entity_is_an_encrypt_error() {
        let encrypter = SecretKeyEncrypter::new(Arc::new(EmptyResolver));
        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();

        let result = encrypter.encrypt_key_for_entity(&key, "https://unknown.example.com");
        assert!(matches!(
            result,
            Err(SamlError::UnableToEncryptKey { entity_id }) if entity_id.contains("unknown")
        ));
    }
}
