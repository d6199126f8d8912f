//! Key transport and payload encryption primitives.
//!
//! Two operations back assertion decryption and relay:
//!
//! - **RSA-OAEP key transport** - unwrap a symmetric key with the local
//!   private key, or wrap one under a recipient's public key
//! - **AES-GCM payloads** - open or seal an encrypted payload laid out as
//!   `IV || ciphertext || tag`, the layout used by XML encryption cipher
//!   values

use aws_lc_rs::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, AES_256_GCM, NONCE_LEN};
use aws_lc_rs::rsa::{
    OaepPrivateDecryptingKey, OaepPublicEncryptingKey, PrivateDecryptingKey, PublicEncryptingKey,
    OAEP_SHA1_MGF1SHA1, OAEP_SHA256_MGF1SHA256,
};

use crate::error::{CryptoError, CryptoResult};

/// AES-GCM tag length in bytes.
const TAG_LEN: usize = 16;

/// A symmetric content-encryption key.
///
/// The key bytes never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.0.len())
    }
}

/// Supported AEAD data-encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeadAlgorithm {
    /// AES-128 in Galois/Counter Mode.
    Aes128Gcm,
    /// AES-256 in Galois/Counter Mode.
    Aes256Gcm,
}

impl AeadAlgorithm {
    /// Returns the key length in bytes.
    #[must_use]
    pub const fn key_len(&self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm => 32,
        }
    }

    fn aead(&self) -> &'static aws_lc_rs::aead::Algorithm {
        match self {
            Self::Aes128Gcm => &AES_128_GCM,
            Self::Aes256Gcm => &AES_256_GCM,
        }
    }
}

/// Supported key-transport algorithms for wrapped symmetric keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransportAlgorithm {
    /// RSA-OAEP with SHA-1 and MGF1-SHA1 (the XML encryption default).
    RsaOaepSha1,
    /// RSA-OAEP with SHA-256 and MGF1-SHA256.
    RsaOaepSha256,
}

impl KeyTransportAlgorithm {
    fn oaep(&self) -> &'static aws_lc_rs::rsa::OaepAlgorithm {
        match self {
            Self::RsaOaepSha1 => &OAEP_SHA1_MGF1SHA1,
            Self::RsaOaepSha256 => &OAEP_SHA256_MGF1SHA256,
        }
    }
}

/// Generates a fresh random symmetric key for the given algorithm.
///
/// # Errors
///
/// Returns an error if the system random source fails.
pub fn generate_key(algorithm: AeadAlgorithm) -> CryptoResult<SymmetricKey> {
    let mut bytes = vec![0u8; algorithm.key_len()];
    aws_lc_rs::rand::fill(&mut bytes)
        .map_err(|_| CryptoError::Encryption("random key generation failed".to_string()))?;
    Ok(SymmetricKey::new(bytes))
}

/// Opens an `IV || ciphertext || tag` cipher value with the given key.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] if the cipher value is truncated,
/// the key length does not match the algorithm, or authentication fails.
pub fn aead_open(
    key: &SymmetricKey,
    algorithm: AeadAlgorithm,
    cipher_value: &[u8],
) -> CryptoResult<Vec<u8>> {
    if cipher_value.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption(
            "cipher value shorter than IV and tag".to_string(),
        ));
    }

    let unbound = UnboundKey::new(algorithm.aead(), key.bytes())
        .map_err(|_| CryptoError::Decryption("key length does not match algorithm".to_string()))?;
    let opening = LessSafeKey::new(unbound);

    let nonce = Nonce::try_assume_unique_for_key(&cipher_value[..NONCE_LEN])
        .map_err(|_| CryptoError::Decryption("invalid IV".to_string()))?;

    let mut in_out = cipher_value[NONCE_LEN..].to_vec();
    let plaintext = opening
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Decryption("payload authentication failed".to_string()))?;

    Ok(plaintext.to_vec())
}

/// Seals a plaintext into an `IV || ciphertext || tag` cipher value.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the key length does not match the
/// algorithm or the random source fails.
pub fn aead_seal(
    key: &SymmetricKey,
    algorithm: AeadAlgorithm,
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let unbound = UnboundKey::new(algorithm.aead(), key.bytes())
        .map_err(|_| CryptoError::Encryption("key length does not match algorithm".to_string()))?;
    let sealing = LessSafeKey::new(unbound);

    let mut iv = [0u8; NONCE_LEN];
    aws_lc_rs::rand::fill(&mut iv)
        .map_err(|_| CryptoError::Encryption("random IV generation failed".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(iv);

    let mut in_out = plaintext.to_vec();
    sealing
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Encryption("sealing failed".to_string()))?;

    let mut cipher_value = Vec::with_capacity(NONCE_LEN + in_out.len());
    cipher_value.extend_from_slice(&iv);
    cipher_value.extend_from_slice(&in_out);
    Ok(cipher_value)
}

/// Unwraps a symmetric key with an RSA private key (PKCS#8 DER).
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKey`] for unusable private key material
/// and [`CryptoError::Unwrap`] when the wrapped key cannot be decrypted.
pub fn unwrap_key(
    private_key_pkcs8: &[u8],
    algorithm: KeyTransportAlgorithm,
    wrapped: &[u8],
) -> CryptoResult<SymmetricKey> {
    let private = PrivateDecryptingKey::from_pkcs8(private_key_pkcs8)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA private key: {e}")))?;
    let key_size = private.key_size_bytes();
    let oaep = OaepPrivateDecryptingKey::new(private)
        .map_err(|e| CryptoError::InvalidKey(format!("key unusable for OAEP: {e}")))?;

    let mut output = vec![0u8; key_size];
    let unwrapped = oaep
        .decrypt(algorithm.oaep(), wrapped, &mut output, None)
        .map_err(|_| CryptoError::Unwrap("OAEP decryption failed".to_string()))?;

    Ok(SymmetricKey::new(unwrapped.to_vec()))
}

/// Wraps a symmetric key under a recipient's RSA public key
/// (`SubjectPublicKeyInfo` DER).
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKey`] for unusable public key material
/// and [`CryptoError::Wrap`] when encryption fails.
pub fn wrap_key(
    public_key_der: &[u8],
    algorithm: KeyTransportAlgorithm,
    key: &SymmetricKey,
) -> CryptoResult<Vec<u8>> {
    let public = PublicEncryptingKey::from_der(public_key_der)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA public key: {e}")))?;
    let key_size = public.key_size_bytes();
    let oaep = OaepPublicEncryptingKey::new(public)
        .map_err(|e| CryptoError::InvalidKey(format!("key unusable for OAEP: {e}")))?;

    let mut output = vec![0u8; key_size];
    let ciphertext = oaep
        .encrypt(algorithm.oaep(), key.bytes(), &mut output, None)
        .map_err(|_| CryptoError::Wrap("OAEP encryption failed".to_string()))?;

    Ok(ciphertext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aead_seal_open_roundtrip() {
        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let sealed = aead_seal(&key, AeadAlgorithm::Aes128Gcm, b"attribute data").unwrap();
        let opened = aead_open(&key, AeadAlgorithm::Aes128Gcm, &sealed).unwrap();
        assert_eq!(opened, b"attribute data");
    }

    #[test]
    fn tampered_cipher_value_fails_authentication() {
        let key = generate_key(AeadAlgorithm::Aes256Gcm).unwrap();
        let mut sealed = aead_seal(&key, AeadAlgorithm::Aes256Gcm, b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        let result = aead_open(&key, AeadAlgorithm::Aes256Gcm, &sealed);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let other = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let sealed = aead_seal(&key, AeadAlgorithm::Aes128Gcm, b"payload").unwrap();

        assert!(aead_open(&other, AeadAlgorithm::Aes128Gcm, &sealed).is_err());
    }

    #[test]
    fn truncated_cipher_value_is_rejected_before_decryption() {
        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let result = aead_open(&key, AeadAlgorithm::Aes128Gcm, &[0u8; 8]);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn key_lengths_match_algorithms() {
        assert_eq!(AeadAlgorithm::Aes128Gcm.key_len(), 16);
        assert_eq!(AeadAlgorithm::Aes256Gcm.key_len(), 32);
    }

    #[test]
    fn symmetric_key_debug_is_redacted() {
        let key = SymmetricKey::new(vec![0x42; 16]);
        assert_eq!(format!("{key:?}"), "SymmetricKey(16 bytes)");
    }

    #[test]
    fn unwrap_with_garbage_private_key_is_invalid_key() {
        let result = unwrap_key(&[0x00; 16], KeyTransportAlgorithm::RsaOaepSha1, &[0u8; 256]);
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn wrap_unwrap_roundtrip_with_generated_rsa_key() {
        use aws_lc_rs::encoding::AsDer;
        use aws_lc_rs::rsa::KeySize;

        let private = PrivateDecryptingKey::generate(KeySize::Rsa2048).unwrap();
        let pkcs8 = private.as_der().unwrap().as_ref().to_vec();
        let public = private.public_key();
        let spki = public.as_der().unwrap().as_ref().to_vec();

        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let wrapped = wrap_key(&spki, KeyTransportAlgorithm::RsaOaepSha1, &key).unwrap();
        let unwrapped = unwrap_key(&pkcs8, KeyTransportAlgorithm::RsaOaepSha1, &wrapped).unwrap();

        assert_eq!(unwrapped, key);
    }

    #[test]
    fn unwrap_with_wrong_private_key_fails() {
        use aws_lc_rs::encoding::AsDer;
        use aws_lc_rs::rsa::KeySize;

        let sender = PrivateDecryptingKey::generate(KeySize::Rsa2048).unwrap();
        let public = sender.public_key();
        let spki = public.as_der().unwrap().as_ref().to_vec();

        let other = PrivateDecryptingKey::generate(KeySize::Rsa2048).unwrap();
        let other_pkcs8 = other.as_der().unwrap().as_ref().to_vec();

        let key = generate_key(AeadAlgorithm::Aes128Gcm).unwrap();
        let wrapped = wrap_key(&spki, KeyTransportAlgorithm::RsaOaepSha1, &key).unwrap();

        let result = unwrap_key(&other_pkcs8, KeyTransportAlgorithm::RsaOaepSha1, &wrapped);
        assert!(matches!(result, Err(CryptoError::Unwrap(_))));
    }
}
