//! Field-level encryption of secrets at rest.
//!
//! Types opt in by implementing [`Secret`], which hands every secret
//! string they carry to a visitor. [`encrypt`] and [`decrypt`] walk a
//! value with a [`Cipher`].

mod cipher;
mod walk;

pub use cipher::Cipher;

/// Error type for secret encryption failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Encryption passphrase is empty")]
    EmptyPassphrase,

    #[error("Encryption error: {0}")]
    Encrypt(String),

    #[error("Decryption error: {0}")]
    Decrypt(String),
}

/// Callback applied to each secret string.
pub type Visitor<'a> = dyn FnMut(&mut String) -> Result<(), SecretError> + 'a;

/// A value holding secret strings.
pub trait Secret {
    /// Calls `f` on every secret string reachable from `self`.
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError>;
}

/// Encrypts every secret string of `value` in place. Strings that are
/// already ciphertext under `cipher` are left untouched.
pub fn encrypt<T: Secret + ?Sized>(value: &mut T, cipher: &Cipher) -> Result<(), SecretError> {
    value.visit(&mut |s: &mut String| {
        if !cipher.is_encrypted(s) {
            *s = cipher.encrypt(s)?;
        }
        Ok(())
    })
}

/// Decrypts every secret string of `value` in place.
pub fn decrypt<T: Secret + ?Sized>(value: &mut T, cipher: &Cipher) -> Result<(), SecretError> {
    value.visit(&mut |s: &mut String| {
        *s = cipher.decrypt(s)?;
        Ok(())
    })
}
