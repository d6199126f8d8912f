//! Assertion decryption and key re-encryption for relay.
//!
//! Two independent operations over the same encrypted payloads: decrypting
//! assertions for the hub's own use, and unwrapping each assertion's
//! symmetric key so it can be re-wrapped for a different recipient without
//! the relayed content ever being decrypted here.

mod algorithms;
mod decrypter;
mod encrypter;
mod secret_key;

pub use algorithms::EncryptionAlgorithmValidator;
pub use decrypter::{AssertionDecrypter, Decrypter};
pub use encrypter::{Encrypter, EncrypterFactory, KeyPlacement};
pub use secret_key::{EncryptionCredentialResolver, SecretKeyEncrypter};
