//! Property-based tests for the message cipher and vault
//!
//! 1. **Round-trip**: decrypt_with(encrypt_for(m, pub), priv) == m
//! 2. **Freshness**: the same message never encrypts the same way twice
//! 3. **Tamper detection**: any single flipped bit in ciphertext, nonce or
//!    ephemeral public key fails with DecryptError
//! 4. **Vault round-trip**: unlock(lock(k, p), p) == k, and any other
//!    password fails with WrongPassword

use hush_core::{
    decrypt_with, encrypt_for, generate_identity, vault, CoreConfig, CryptoContext, Error,
    KdfParams, Nonce, PrivateKey, PublicKey,
};
use proptest::prelude::*;

fn ctx() -> CryptoContext {
    CryptoContext::initialize(CoreConfig {
        kdf: KdfParams::new(256, 1, 1).unwrap(),
        ..CoreConfig::default()
    })
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_encrypt_decrypt_roundtrip(plaintext in "\\PC{0,512}") {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();

        let sealed = encrypt_for(&ctx, &plaintext, &public).unwrap();
        let opened = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &sealed.ephemeral_public_key,
            &sealed.nonce,
            &private,
        )
        .unwrap();

        prop_assert_eq!(opened.as_str(), plaintext.as_str());
    }

    #[test]
    fn prop_same_message_encrypts_freshly(plaintext in "\\PC{1,64}") {
        let ctx = ctx();
        let (public, _) = generate_identity(&ctx).unwrap().into_parts();

        let a = encrypt_for(&ctx, &plaintext, &public).unwrap();
        let b = encrypt_for(&ctx, &plaintext, &public).unwrap();

        prop_assert_ne!(a.ciphertext, b.ciphertext);
        prop_assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        prop_assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn prop_ciphertext_bit_flip_detected(
        plaintext in "\\PC{1,128}",
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        let sealed = encrypt_for(&ctx, &plaintext, &public).unwrap();

        let mut ciphertext = sealed.ciphertext.clone();
        let i = index.index(ciphertext.len());
        ciphertext[i] ^= 1 << bit;

        let result = decrypt_with(
            &ctx,
            &ciphertext,
            &sealed.ephemeral_public_key,
            &sealed.nonce,
            &private,
        );
        prop_assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn prop_nonce_bit_flip_detected(index in 0usize..24, bit in 0u8..8) {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        let sealed = encrypt_for(&ctx, "hello", &public).unwrap();

        let mut nonce = *sealed.nonce.as_bytes();
        nonce[index] ^= 1 << bit;

        let result = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &sealed.ephemeral_public_key,
            &Nonce::from_bytes(nonce),
            &private,
        );
        prop_assert_eq!(result.unwrap_err(), Error::DecryptError);
    }

    #[test]
    fn prop_ephemeral_key_bit_flip_detected(index in 0usize..32, bit in 0u8..8) {
        let ctx = ctx();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        let sealed = encrypt_for(&ctx, "hello", &public).unwrap();

        let mut epk = *sealed.ephemeral_public_key.as_bytes();
        epk[index] ^= 1 << bit;

        let result = decrypt_with(
            &ctx,
            &sealed.ciphertext,
            &PublicKey::from_bytes(epk),
            &sealed.nonce,
            &private,
        );
        prop_assert_eq!(result.unwrap_err(), Error::DecryptError);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_vault_roundtrip(key in any::<[u8; 32]>(), password in "\\PC{0,32}") {
        let ctx = ctx();

        let blob = vault::lock(&ctx, PrivateKey::from_bytes(key), &password).unwrap();
        let restored = vault::unlock(&ctx, &blob, &password).unwrap();

        prop_assert_eq!(restored.as_bytes(), &key);
    }

    #[test]
    fn prop_vault_other_password_fails(
        password in "[a-z]{1,16}",
        other in "[A-Z]{1,16}",
    ) {
        let ctx = ctx();

        let blob = vault::lock(&ctx, PrivateKey::from_bytes([9u8; 32]), &password).unwrap();
        let result = vault::unlock(&ctx, &blob, &other);

        prop_assert_eq!(result.unwrap_err(), Error::WrongPassword);
    }
}
