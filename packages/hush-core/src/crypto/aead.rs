//! # Authenticated Encryption
//!
//! XChaCha20-Poly1305 with 24-byte random nonces. Used by the password
//! vault (secretbox role) and by the message cipher once the box key has
//! been derived.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seal(key, nonce, plaintext, aad) → ciphertext || tag(16)               │
//! │  open(key, nonce, ciphertext || tag, aad) → plaintext | auth failure    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::keys::Nonce;
use crate::error::{Error, Result};

/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of a symmetric key in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// A 256-bit symmetric key
///
/// Zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// All-zero key, overwritten in place by the KDFs
    pub(crate) fn zeroed() -> Self {
        Self([0u8; SYMMETRIC_KEY_SIZE])
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; SYMMETRIC_KEY_SIZE] {
        &mut self.0
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

/// Encrypt and authenticate `plaintext`
pub fn seal(key: &SymmetricKey, nonce: &Nonce, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    key.cipher()
        .encrypt(
            XNonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| Error::EncryptionFailed("AEAD seal failed".into()))
}

/// Verify and decrypt `ciphertext`
///
/// Fails closed with `DecryptError` on any tag mismatch; callers that must
/// report something else (the vault) map the error themselves.
pub fn open(
    key: &SymmetricKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::DecryptError);
    }

    key.cipher()
        .decrypt(
            XNonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| Error::DecryptError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_basic() {
        let key = SymmetricKey::from_bytes([42u8; 32]);
        let nonce = Nonce::random().unwrap();

        let ciphertext = seal(&key, &nonce, b"Hello, World!", b"context").unwrap();
        assert_eq!(ciphertext.len(), 13 + TAG_SIZE);

        let plaintext = open(&key, &nonce, &ciphertext, b"context").unwrap();
        assert_eq!(plaintext.as_slice(), b"Hello, World!");
    }

    #[test]
    fn test_seal_open_empty() {
        let key = SymmetricKey::from_bytes([42u8; 32]);
        let nonce = Nonce::random().unwrap();

        let ciphertext = seal(&key, &nonce, b"", b"").unwrap();
        let plaintext = open(&key, &nonce, &ciphertext, b"").unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = SymmetricKey::from_bytes([42u8; 32]);
        let nonce = Nonce::random().unwrap();

        let ciphertext = seal(&key, &nonce, b"payload", b"context").unwrap();
        let result = open(&key, &nonce, &ciphertext, b"wrong context");
        assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = SymmetricKey::from_bytes([42u8; 32]);
        let key2 = SymmetricKey::from_bytes([99u8; 32]);
        let nonce = Nonce::random().unwrap();

        let ciphertext = seal(&key1, &nonce, b"payload", b"").unwrap();
        assert!(open(&key2, &nonce, &ciphertext, b"").is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = SymmetricKey::from_bytes([42u8; 32]);
        let nonce = Nonce::random().unwrap();

        let ciphertext = seal(&key, &nonce, b"payload", b"").unwrap();
        assert!(open(&key, &nonce, &ciphertext[..TAG_SIZE - 1], b"").is_err());
        assert!(open(&key, &nonce, &ciphertext[..ciphertext.len() - 1], b"").is_err());
    }
}
