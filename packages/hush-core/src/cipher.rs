//! # Message Cipher
//!
//! Sealed-sender public-key encryption of a single message.
//!
//! ## Per-Message Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SENDER                         RECIPIENT             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ephemeral = fresh X25519 key pair                                     │
//! │  shared    = X25519(ephemeral.private, recipient.public)               │
//! │  key       = HKDF(shared, epk || rpk)                                  │
//! │  nonce     = 24 random bytes                                           │
//! │  ct        = XChaCha20-Poly1305(key, nonce, msg, aad = epk)            │
//! │  drop ephemeral.private                                                │
//! │                                                                         │
//! │         ──── { ct, ephemeralPublicKey, nonce } ────►                   │
//! │                                                                         │
//! │                               shared = X25519(own.private, epk)        │
//! │                               key    = HKDF(shared, epk || own.public) │
//! │                               msg    = open(key, nonce, ct, aad = epk) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ephemeral private key exists only for the duration of
//! [`encrypt_for`]. Compromise of the sender's long-term identity key
//! reveals nothing about messages they sent.
//!
//! ## Failure Modes
//!
//! - `InvalidKey`: the recipient public key is a low-order point (the
//!   shared secret would be all zeros). Length is enforced by `PublicKey`.
//! - `DecryptError`: anything at all going wrong on the receiving side.
//!   No partial plaintext is ever returned.

use zeroize::{Zeroize, Zeroizing};

use crate::context::CryptoContext;
use crate::crypto::{aead, kdf, Nonce, PrivateKey, PublicKey};
use crate::error::{Error, Result};

/// Output of [`encrypt_for`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Ciphertext with the 16-byte tag appended
    pub ciphertext: Vec<u8>,
    /// Public half of the single-use sender key
    pub ephemeral_public_key: PublicKey,
    /// Fresh random nonce
    pub nonce: Nonce,
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s private
/// key can read it
pub fn encrypt_for(
    _ctx: &CryptoContext,
    plaintext: &str,
    recipient: &PublicKey,
) -> Result<SealedMessage> {
    let ephemeral = PrivateKey::generate()?;
    let ephemeral_public_key = ephemeral.public_key();

    let shared = ephemeral.to_x25519().diffie_hellman(&recipient.to_x25519());
    drop(ephemeral);

    if !shared.was_contributory() {
        tracing::warn!(recipient = %recipient.fingerprint(), "Refusing low-order recipient key");
        return Err(Error::InvalidKey("recipient key is a low-order point".into()));
    }

    let key = kdf::derive_box_key(&shared, &ephemeral_public_key, recipient)?;
    let nonce = Nonce::random()?;
    let ciphertext = aead::seal(
        &key,
        &nonce,
        plaintext.as_bytes(),
        ephemeral_public_key.as_bytes(),
    )?;

    Ok(SealedMessage {
        ciphertext,
        ephemeral_public_key,
        nonce,
    })
}

/// Decrypt a message addressed to `own_private_key`
///
/// Pure: no I/O, no logging of contents. Every failure is `DecryptError`.
pub fn decrypt_with(
    _ctx: &CryptoContext,
    ciphertext: &[u8],
    ephemeral_public_key: &PublicKey,
    nonce: &Nonce,
    own_private_key: &PrivateKey,
) -> Result<Zeroizing<String>> {
    let secret = own_private_key.to_x25519();
    let shared = secret.diffie_hellman(&ephemeral_public_key.to_x25519());
    drop(secret);

    if !shared.was_contributory() {
        return Err(Error::DecryptError);
    }

    let own_public_key = own_private_key.public_key();
    let key = kdf::derive_box_key(&shared, ephemeral_public_key, &own_public_key)
        .map_err(|_| Error::DecryptError)?;

    let mut bytes = aead::open(&key, nonce, ciphertext, ephemeral_public_key.as_bytes())?;

    match String::from_utf8(std::mem::take(&mut *bytes)) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(e) => {
            e.into_bytes().zeroize();
            Err(Error::DecryptError)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::generate_identity;

    fn ctx() -> CryptoContext {
        CryptoContext::with_defaults().unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_hello() {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();

        let sealed = encrypt_for(&ctx, "hello", &public).unwrap();
        let opened = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &sealed.ephemeral_public_key,
            &sealed.nonce,
            &private,
        )
        .unwrap();

        assert_eq!(opened.as_str(), "hello");
        assert_eq!(sealed.ciphertext.len(), 5 + aead::TAG_SIZE);
    }

    #[test]
    fn test_empty_and_unicode_plaintext() {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();

        for text in ["", "héllo wörld 🔐", "line one\nline two"] {
            let sealed = encrypt_for(&ctx, text, &public).unwrap();
            let opened = decrypt_with(
                &ctx,
                &sealed.ciphertext,
                &sealed.ephemeral_public_key,
                &sealed.nonce,
                &private,
            )
            .unwrap();
            assert_eq!(opened.as_str(), text);
        }
    }

    #[test]
    fn test_fresh_ephemeral_and_nonce_each_time() {
        let ctx = ctx();
        let (public, _) = generate_identity(&ctx).unwrap().into_parts();

        let a = encrypt_for(&ctx, "same message", &public).unwrap();
        let b = encrypt_for(&ctx, "same message", &public).unwrap();

        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let ctx = ctx();
        let (public, _) = generate_identity(&ctx).unwrap().into_parts();
        let (_, other) = generate_identity(&ctx).unwrap().into_parts();

        let sealed = encrypt_for(&ctx, "secret", &public).unwrap();
        let result = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &sealed.ephemeral_public_key,
            &sealed.nonce,
            &other,
        );
        assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn test_low_order_recipient_rejected() {
        let ctx = ctx();
        let zero = PublicKey::from_bytes([0u8; 32]);

        assert!(matches!(
            encrypt_for(&ctx, "hi", &zero),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_low_order_ephemeral_rejected() {
        let ctx = ctx();
        let (_, private) = generate_identity(&ctx).unwrap().into_parts();

        let result = decrypt_with(
            &ctx,
            &[0u8; 32],
            &PublicKey::from_bytes([0u8; 32]),
            &Nonce::from_bytes([0u8; 24]),
            &private,
        );
        assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn test_top_bit_of_ephemeral_key_is_authenticated() {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        let sealed = encrypt_for(&ctx, "hello", &public).unwrap();

        let mut epk = *sealed.ephemeral_public_key.as_bytes();
        epk[31] ^= 0x80;

        let result = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &PublicKey::from_bytes(epk),
            &sealed.nonce,
            &private,
        );
        assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        let sealed = encrypt_for(&ctx, "hello", &public).unwrap();

        for len in [0, 1, aead::TAG_SIZE, sealed.ciphertext.len() - 1] {
            let result = decrypt_with(
                &ctx,
                &sealed.ciphertext[..len],
                &sealed.ephemeral_public_key,
                &sealed.nonce,
                &private,
            );
            assert_eq!(result.unwrap_err(), Error::DecryptError);
        }
    }
}
