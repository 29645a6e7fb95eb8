//! # Key Derivation Functions
//!
//! Two derivations live here:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KEY DERIVATION                                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PASSWORD → VAULT KEY                         │   │
//! │  │                                                                 │   │
//! │  │  Argon2id v0x13(                                               │   │
//! │  │    password,                                                   │   │
//! │  │    salt = 16 random bytes (stored with the blob),             │   │
//! │  │    m/t/p = KdfParams (stored with the blob)                   │   │
//! │  │  )                                                            │   │
//! │  │                                                                 │   │
//! │  │  → 32-byte XChaCha20-Poly1305 key                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    X25519 SHARED SECRET → BOX KEY               │   │
//! │  │                                                                 │   │
//! │  │  HKDF-SHA256(                                                  │   │
//! │  │    ikm  = X25519(ephemeral, recipient),                       │   │
//! │  │    salt = ephemeral_public || recipient_public,               │   │
//! │  │    info = "hush-box-key-v1"                                   │   │
//! │  │  )                                                            │   │
//! │  │                                                                 │   │
//! │  │  → 32-byte XChaCha20-Poly1305 key                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hashing both public keys into the salt authenticates every bit of the
//! ephemeral key, including the top bit X25519 masks off.

use argon2::{Algorithm, Argon2, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::SharedSecret;
use zeroize::Zeroize;

use super::aead::SymmetricKey;
use super::keys::{PublicKey, Salt, KEY_SIZE};
use crate::config::KdfParams;
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
pub mod domain {
    /// Domain for the per-message box key
    pub const BOX_KEY: &[u8] = b"hush-box-key-v1";
}

/// Derive the vault key from a password with Argon2id
///
/// Deliberately slow. Run it off latency-sensitive threads.
pub fn derive_password_key(
    password: &[u8],
    salt: &Salt,
    params: &KdfParams,
) -> Result<SymmetricKey> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut key = SymmetricKey::zeroed();
    argon2
        .hash_password_into(password, salt.as_bytes(), key.as_mut_bytes())
        .map_err(|e| Error::KeyDerivationFailed(format!("Argon2id failed: {}", e)))?;

    Ok(key)
}

/// Derive the box key for one message
///
/// Both parties compute the same shared secret:
/// - sender: ephemeral_secret × recipient_public
/// - recipient: recipient_secret × ephemeral_public
pub fn derive_box_key(
    shared_secret: &SharedSecret,
    ephemeral_public: &PublicKey,
    recipient_public: &PublicKey,
) -> Result<SymmetricKey> {
    let mut salt = [0u8; 2 * KEY_SIZE];
    salt[..KEY_SIZE].copy_from_slice(ephemeral_public.as_bytes());
    salt[KEY_SIZE..].copy_from_slice(recipient_public.as_bytes());

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared_secret.as_bytes());
    let mut key = SymmetricKey::zeroed();
    let expanded = hkdf.expand(domain::BOX_KEY, key.as_mut_bytes());
    salt.zeroize();

    expanded.map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;
    Ok(key)
}

// ============================================================================
// TESTS
// ============================================================================
