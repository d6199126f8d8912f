//! Decrypting assertions and unwrapping their symmetric keys.
//!
//! The batch semantics here are deliberate and asymmetric. Decrypting for
//! use fails the whole batch on the first bad assertion. Re-encrypting
//! keys for relay tolerates bad *candidate keys* within an assertion
//! (metadata may list a decoy or stale key alongside the real one) but
//! still fails the batch when an assertion has no usable key at all.

use base64::Engine;
use fedhub_crypto::{aead_open, unwrap_key, Credential, CryptoError, CryptoResult, SymmetricKey};

use super::algorithms::{aead_from_uri, key_transport_from_uri, EncryptionAlgorithmValidator};
use super::secret_key::SecretKeyEncrypter;
use crate::error::{SamlError, SamlResult};
use crate::types::{Assertion, EncryptedAssertion, EncryptedKey};
use crate::validated::ValidatedResponse;

/// Low-level decrypter over the hub's decrypting credentials.
pub struct Decrypter {
    decrypting_credentials: Vec<Credential>,
}

impl Decrypter {
    /// Creates a decrypter holding the hub's decrypting credentials.
    #[must_use]
    pub fn new(decrypting_credentials: Vec<Credential>) -> Self {
        Self {
            decrypting_credentials,
        }
    }

    /// Unwraps one encrypted key with the hub's private keys.
    ///
    /// # Errors
    ///
    /// Returns an error when the key-transport algorithm is unknown, the
    /// cipher value is not base64, or no decrypting credential unwraps it.
    pub fn decrypt_key(&self, encrypted_key: &EncryptedKey) -> CryptoResult<SymmetricKey> {
        let algorithm_uri = encrypted_key.algorithm().ok_or_else(|| {
            CryptoError::UnsupportedAlgorithm("missing key transport algorithm".to_string())
        })?;
        let transport = key_transport_from_uri(algorithm_uri)
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(algorithm_uri.to_string()))?;

        let wrapped = base64::engine::general_purpose::STANDARD
            .decode(encrypted_key.cipher_data.cipher_value.trim())
            .map_err(|e| CryptoError::Unwrap(format!("invalid key encoding: {e}")))?;

        let mut last_error = None;
        for credential in &self.decrypting_credentials {
            let Some(private_key) = credential.private_key_der() else {
                continue;
            };
            match unwrap_key(private_key, transport, &wrapped) {
                Ok(key) => return Ok(key),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| CryptoError::Unwrap("no decrypting credential held".to_string())))
    }

    /// Decrypts one encrypted assertion.
    ///
    /// Candidate keys are taken from the assertion's own key list, falling
    /// back to the list nested in the encrypted data's key info; the first
    /// key that unwraps is used to open the payload.
    ///
    /// # Errors
    ///
    /// Returns an error when no candidate key unwraps, the payload fails
    /// authentication, or the plaintext is not a well-formed assertion.
    pub fn decrypt_assertion(
        &self,
        encrypted_assertion: &EncryptedAssertion,
    ) -> CryptoResult<Assertion> {
        let algorithm_uri = encrypted_assertion.algorithm().ok_or_else(|| {
            CryptoError::UnsupportedAlgorithm("missing data encryption algorithm".to_string())
        })?;
        let data_algorithm = aead_from_uri(algorithm_uri)
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(algorithm_uri.to_string()))?;

        let candidates = encrypted_assertion.candidate_keys();
        if candidates.is_empty() {
            return Err(CryptoError::Unwrap("no encrypted key present".to_string()));
        }

        let mut last_error = None;
        let mut key = None;
        for encrypted_key in candidates {
            match self.decrypt_key(encrypted_key) {
                Ok(unwrapped) => {
                    key = Some(unwrapped);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let Some(key) = key else {
            return Err(last_error
                .unwrap_or_else(|| CryptoError::Unwrap("no usable encrypted key".to_string())));
        };

        let cipher_value = base64::engine::general_purpose::STANDARD
            .decode(encrypted_assertion.encrypted_data.cipher_data.cipher_value.trim())
            .map_err(|e| CryptoError::Decryption(format!("invalid payload encoding: {e}")))?;
        let plaintext = aead_open(&key, data_algorithm, &cipher_value)?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| CryptoError::Decryption(format!("assertion payload malformed: {e}")))
    }
}

impl std::fmt::Debug for Decrypter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decrypter")
            .field("decrypting_credentials", &self.decrypting_credentials.len())
            .finish()
    }
}

/// Policy-level assertion decryption over validated responses.
pub struct AssertionDecrypter {
    algorithm_validator: EncryptionAlgorithmValidator,
    decrypter: Decrypter,
}

impl AssertionDecrypter {
    /// Creates an assertion decrypter.
    #[must_use]
    pub fn new(algorithm_validator: EncryptionAlgorithmValidator, decrypter: Decrypter) -> Self {
        Self {
            algorithm_validator,
            decrypter,
        }
    }

    /// Decrypts every encrypted assertion in the container.
    ///
    /// Each assertion's declared algorithms are checked against the
    /// allow-list before any cryptographic work. The first failure aborts
    /// the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::DisallowedAlgorithm`] before decryption is
    /// attempted, or [`SamlError::UnableToDecrypt`] naming the assertion
    /// that failed.
    pub fn decrypt_assertions(&self, container: &ValidatedResponse) -> SamlResult<Vec<Assertion>> {
        let mut assertions = Vec::new();

        for encrypted_assertion in container.encrypted_assertions() {
            self.algorithm_validator.validate(encrypted_assertion)?;
            let assertion = self
                .decrypter
                .decrypt_assertion(encrypted_assertion)
                .map_err(|e| SamlError::UnableToDecrypt {
                    assertion_id: encrypted_assertion.id.clone(),
                    cause: e.to_string(),
                })?;
            assertions.push(assertion);
        }

        Ok(assertions)
    }

    /// Unwraps each assertion's symmetric key and re-wraps it for
    /// `entity_id`, returning the base64 wrapped keys in assertion order.
    ///
    /// Candidate keys come from the assertion's own key list first, then
    /// from the list nested inside the encrypted data's key info. Within an
    /// assertion, candidates are tried in order and the first successful
    /// unwrap wins; a failing candidate is only fatal when it is the last.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::UnableToLocateEncryptedKey`] when an assertion
    /// has no candidate keys at all, and [`SamlError::UnableToDecryptKey`]
    /// naming the last algorithm attempted when every candidate fails.
    pub fn re_encrypted_keys(
        &self,
        container: &ValidatedResponse,
        secret_key_encrypter: &SecretKeyEncrypter,
        entity_id: &str,
    ) -> SamlResult<Vec<String>> {
        let mut re_encrypted_keys = Vec::new();

        for encrypted_assertion in container.encrypted_assertions() {
            let candidates = encrypted_assertion.candidate_keys();
            if candidates.is_empty() {
                return Err(SamlError::UnableToLocateEncryptedKey);
            }

            let mut algorithm = String::new();
            let mut unwrapped = None;
            for (index, encrypted_key) in candidates.iter().enumerate() {
                algorithm = encrypted_key.algorithm().unwrap_or_default().to_string();
                match self.decrypter.decrypt_key(encrypted_key) {
                    Ok(key) => {
                        unwrapped = Some(key);
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "candidate encrypted key failed to unwrap");
                        if index + 1 == candidates.len() {
                            return Err(SamlError::UnableToDecryptKey { algorithm });
                        }
                    }
                }
            }

            if let Some(key) = unwrapped {
                re_encrypted_keys
                    .push(secret_key_encrypter.encrypt_key_for_entity(&key, entity_id)?);
            }
        }

        Ok(re_encrypted_keys)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use aws_lc_rs::encoding::AsDer;
    use aws_lc_rs::rsa::{KeySize, PrivateDecryptingKey};
    use fedhub_crypto::{KeyTransportAlgorithm, KeyUsage};

    use super::*;
    use crate::decrypt::{EncrypterFactory, EncryptionCredentialResolver, KeyPlacement};
    use crate::types::constants::key_transport_algorithms;
    use crate::types::{CipherData, EncryptionMethod, Response};

    struct TestKey {
        pkcs8: Vec<u8>,
        spki: Vec<u8>,
    }

    fn generate_rsa_key() -> TestKey {
        let private = PrivateDecryptingKey::generate(KeySize::Rsa2048).unwrap();
        let pkcs8 = private.as_der().unwrap().as_ref().to_vec();
        let public = private.public_key();
        let spki = public.as_der().unwrap().as_ref().to_vec();
        TestKey { pkcs8, spki }
    }

    fn key_pair_credential(entity_id: &str, key: &TestKey) -> Credential {
        Credential::from_public_key_der(entity_id, KeyUsage::Encryption, key.spki.clone())
            .with_private_key(key.pkcs8.clone())
    }

    struct MapResolver(HashMap<String, Credential>);

    impl EncryptionCredentialResolver for MapResolver {
        fn encrypting_credential(&self, entity_id: &str) -> Option<Credential> {
            self.0.get(entity_id).cloned()
        }
    }

    const HUB: &str = "https://hub.example.com";
    const ASSERTION_ID: &str = "test-assertion";

    struct Fixture {
        hub_key: TestKey,
        assertion_decrypter: AssertionDecrypter,
        secret_key_encrypter: SecretKeyEncrypter,
    }

    fn fixture() -> Fixture {
        let hub_key = generate_rsa_key();
        let hub_credential = key_pair_credential(HUB, &hub_key);

        let assertion_decrypter = AssertionDecrypter::new(
            EncryptionAlgorithmValidator::default(),
            Decrypter::new(vec![hub_credential.clone()]),
        );
        let secret_key_encrypter = SecretKeyEncrypter::new(Arc::new(MapResolver(
            HashMap::from([(HUB.to_string(), hub_credential)]),
        )));

        Fixture {
            hub_key,
            assertion_decrypter,
            secret_key_encrypter,
        }
    }

    fn encrypted_assertion_for(spki: &[u8], placement: KeyPlacement) -> EncryptedAssertion {
        let recipient =
            Credential::from_public_key_der(HUB, KeyUsage::Encryption, spki.to_vec());
        let encrypter = EncrypterFactory::new()
            .with_key_placement(placement)
            .create_encrypter()
            .unwrap();
        let assertion = Assertion::new("https://idp.example.com")
            .with_id(ASSERTION_ID)
            .with_subject("subject-1");
        encrypter.encrypt_assertion(&assertion, &recipient).unwrap()
    }

    fn response_for(assertions: Vec<EncryptedAssertion>) -> ValidatedResponse {
        let mut response = Response::success("https://idp.example.com");
        for assertion in assertions {
            response = response.with_encrypted_assertion(assertion);
        }
        ValidatedResponse::new(response)
    }

    #[test]
    fn converts_encrypted_assertion_into_assertion() {
        let f = fixture();
        let response = response_for(vec![encrypted_assertion_for(
            &f.hub_key.spki,
            KeyPlacement::Peer,
        )]);

        let assertions = f.assertion_decrypter.decrypt_assertions(&response).unwrap();
        assert_eq!(assertions.len(), 1);
        assert_eq!(assertions[0].id, ASSERTION_ID);
        assert_eq!(assertions[0].subject.as_deref(), Some("subject-1"));
    }

    #[test]
    fn provides_one_re_encrypted_symmetric_key() {
        let f = fixture();
        let response = response_for(vec![encrypted_assertion_for(
            &f.hub_key.spki,
            KeyPlacement::Peer,
        )]);

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB)
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn provides_re_encrypted_key_when_key_nested_in_encrypted_data() {
        let f = fixture();
        let response = response_for(vec![encrypted_assertion_for(
            &f.hub_key.spki,
            KeyPlacement::Inline,
        )]);

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB)
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn provides_three_re_encrypted_symmetric_keys() {
        let f = fixture();
        let response = response_for(vec![
            encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer),
            encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer),
            encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer),
        ]);

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB)
            .unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn provides_zero_re_encrypted_keys_for_empty_response() {
        let f = fixture();
        let response = response_for(Vec::new());

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB)
            .unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn throws_if_no_key_can_be_decrypted() {
        let f = fixture();
        // Encrypted for someone who is not the hub.
        let other = generate_rsa_key();
        let response = response_for(vec![encrypted_assertion_for(
            &other.spki,
            KeyPlacement::Peer,
        )]);

        let result =
            f.assertion_decrypter
                .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB);
        assert!(matches!(
            result,
            Err(SamlError::UnableToDecryptKey { algorithm })
                if algorithm == key_transport_algorithms::RSA_OAEP_MGF1P
        ));
    }

    #[test]
    fn bad_candidate_key_does_not_prevent_success() {
        let f = fixture();
        let mut encrypted = encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer);
        let bad_key = EncryptedKey {
            encryption_method: Some(EncryptionMethod::new(
                key_transport_algorithms::RSA_OAEP_MGF1P,
            )),
            cipher_data: CipherData::new(
                base64::engine::general_purpose::STANDARD.encode([0u8; 256]),
            ),
        };
        encrypted.encrypted_keys.insert(0, bad_key);
        let response = response_for(vec![encrypted]);

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB)
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn assertion_without_any_key_is_a_locate_error() {
        let f = fixture();
        let mut encrypted = encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer);
        encrypted.encrypted_keys.clear();
        encrypted.encrypted_data.key_info = None;
        let response = response_for(vec![encrypted]);

        let result =
            f.assertion_decrypter
                .re_encrypted_keys(&response, &f.secret_key_encrypter, HUB);
        assert!(matches!(result, Err(SamlError::UnableToLocateEncryptedKey)));
    }

    #[test]
    fn throws_if_assertion_cannot_be_decrypted() {
        let f = fixture();
        let other = generate_rsa_key();
        let response = response_for(vec![encrypted_assertion_for(
            &other.spki,
            KeyPlacement::Peer,
        )]);

        let result = f.assertion_decrypter.decrypt_assertions(&response);
        assert!(matches!(
            result,
            Err(SamlError::UnableToDecrypt { assertion_id, .. }) if assertion_id == ASSERTION_ID
        ));
    }

    #[test]
    fn first_bad_assertion_aborts_the_whole_batch() {
        let f = fixture();
        let other = generate_rsa_key();
        let response = response_for(vec![
            encrypted_assertion_for(&other.spki, KeyPlacement::Peer),
            encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer),
        ]);

        assert!(f.assertion_decrypter.decrypt_assertions(&response).is_err());
    }

    #[test]
    fn disallowed_algorithm_fails_before_any_unwrap() {
        let f = fixture();
        let mut encrypted = encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer);
        encrypted.encrypted_data.encryption_method = Some(EncryptionMethod::new(
            crate::types::constants::encryption_algorithms::AES128_CBC,
        ));
        let response = response_for(vec![encrypted]);

        let result = f.assertion_decrypter.decrypt_assertions(&response);
        assert!(matches!(result, Err(SamlError::DisallowedAlgorithm { .. })));
    }

    #[test]
    fn re_encrypted_key_opens_the_original_payload_for_the_new_recipient() {
        let f = fixture();
        let relay_target = generate_rsa_key();
        const TARGET: &str = "https://sp.example.com";

        let secret_key_encrypter = SecretKeyEncrypter::new(Arc::new(MapResolver(
            HashMap::from([(TARGET.to_string(), key_pair_credential(TARGET, &relay_target))]),
        )));

        let encrypted = encrypted_assertion_for(&f.hub_key.spki, KeyPlacement::Peer);
        let cipher_value = base64::engine::general_purpose::STANDARD
            .decode(&encrypted.encrypted_data.cipher_data.cipher_value)
            .unwrap();
        let response = response_for(vec![encrypted]);

        let keys = f
            .assertion_decrypter
            .re_encrypted_keys(&response, &secret_key_encrypter, TARGET)
            .unwrap();

        // The relay target can unwrap the re-wrapped key and open the
        // original payload with it.
        let wrapped = base64::engine::general_purpose::STANDARD.decode(&keys[0]).unwrap();
        let symmetric_key = fedhub_crypto::unwrap_key(
            &relay_target.pkcs8,
            KeyTransportAlgorithm::RsaOaepSha1,
            &wrapped,
        )
        .unwrap();
        let plaintext = aead_open(
            &symmetric_key,
            fedhub_crypto::AeadAlgorithm::Aes128Gcm,
            &cipher_value,
        )
        .unwrap();
        let assertion: Assertion = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(assertion.id, ASSERTION_ID);
    }
}
