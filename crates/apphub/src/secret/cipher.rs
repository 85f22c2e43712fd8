//! AES-256-GCM keyed by a passphrase.

use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::SecretError;

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

const KEY_SIZE: usize = 32;

/// Encrypts and decrypts single string values.
///
/// The key is the trimmed passphrase repeated until it fills 32 bytes.
/// Ciphertext is `base64(nonce || sealed)` using the standard alphabet.
/// The empty string encrypts and decrypts to itself.
#[derive(Clone)]
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn new(passphrase: &str) -> Result<Self, SecretError> {
        let passphrase = passphrase.trim().as_bytes();
        if passphrase.is_empty() {
            return Err(SecretError::EmptyPassphrase);
        }
        let key: Vec<u8> = passphrase.iter().copied().cycle().take(KEY_SIZE).collect();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plain: &str) -> Result<String, SecretError> {
        if plain.is_empty() {
            return Ok(String::new());
        }
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plain.as_bytes())
            .map_err(|e| SecretError::Encrypt(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend(sealed);
        Ok(STANDARD.encode(combined))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String, SecretError> {
        if encrypted.is_empty() {
            return Ok(String::new());
        }
        let combined = STANDARD
            .decode(encrypted)
            .map_err(|e| SecretError::Decrypt(format!("Invalid base64: {}", e)))?;
        if combined.len() < NONCE_SIZE {
            return Err(SecretError::Decrypt("Ciphertext too short".to_string()));
        }

        let (nonce, sealed) = combined.split_at(NONCE_SIZE);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| SecretError::Decrypt(e.to_string()))?;

        String::from_utf8(plain).map_err(|e| SecretError::Decrypt(format!("Invalid UTF-8: {}", e)))
    }

    /// Whether `value` is ciphertext produced under this key.
    pub fn is_encrypted(&self, value: &str) -> bool {
        !value.is_empty() && self.decrypt(value).is_ok()
    }
}
