//! # Password Vault
//!
//! Keeps the identity private key encrypted at rest behind the user's
//! password.
//!
//! ## Lock / Unlock Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      VAULT                                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  lock(private_key, password)                                           │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  salt  = 16 random bytes                                     │       │
//! │  │  nonce = 24 random bytes                                     │       │
//! │  │  key   = Argon2id(password, salt, KdfParams)                │       │
//! │  │  blob  = XChaCha20-Poly1305(key, nonce, private_key)        │       │
//! │  │  zeroize(key, private_key)                                   │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  unlock(blob, password)                                                │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  key = Argon2id(password, blob.salt, blob.kdf)              │       │
//! │  │  open(key, blob.nonce, blob.ciphertext)                      │       │
//! │  │     ├── ok       → PrivateKey                               │       │
//! │  │     └── mismatch → WrongPassword                            │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A wrong password and a corrupted blob both surface as `WrongPassword`.
//! There is no server-side reset: the password is the only path back to
//! the private key and therefore to message history.
//!
//! Key derivation takes hundreds of milliseconds. Async callers should use
//! [`lock_in_background`] / [`unlock_in_background`], which move the work
//! onto tokio's blocking pool.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::KdfParams;
use crate::context::CryptoContext;
use crate::crypto::{aead, kdf, Nonce, PrivateKey, Salt};
use crate::encoding::base64_vec;
use crate::error::{Error, Result};

/// Associated data binding vault ciphertexts to their purpose
const VAULT_AAD: &[u8] = b"hush-private-key-v1";

/// The identity private key, encrypted under a password-derived key
///
/// Stored on the user's profile as `privateKeyEncrypted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPrivateKey {
    /// XChaCha20-Poly1305 ciphertext and tag
    #[serde(rename = "encrypted", with = "base64_vec")]
    pub ciphertext: Vec<u8>,

    /// Argon2id salt
    pub salt: Salt,

    /// AEAD nonce
    pub nonce: Nonce,

    /// Argon2id cost the blob was sealed with
    #[serde(default)]
    pub kdf: KdfParams,
}

/// Encrypt `private_key` under `password`
///
/// Takes ownership of the key so the plaintext copy is zeroized when this
/// returns.
pub fn lock(
    ctx: &CryptoContext,
    private_key: PrivateKey,
    password: &str,
) -> Result<EncryptedPrivateKey> {
    let salt = Salt::random()?;
    let nonce = Nonce::random()?;
    let params = ctx.config().kdf;

    let key = kdf::derive_password_key(password.as_bytes(), &salt, &params)?;
    let ciphertext = aead::seal(&key, &nonce, private_key.as_bytes(), VAULT_AAD)?;
    drop(private_key);

    tracing::info!(
        m_cost_kib = params.m_cost_kib,
        t_cost = params.t_cost,
        "Private key locked"
    );

    Ok(EncryptedPrivateKey {
        ciphertext,
        salt,
        nonce,
        kdf: params,
    })
}

/// Decrypt the private key with `password`
///
/// ## Errors
///
/// `WrongPassword` for a bad password, a tampered ciphertext, salt, nonce
/// or cost field alike.
pub fn unlock(
    _ctx: &CryptoContext,
    blob: &EncryptedPrivateKey,
    password: &str,
) -> Result<PrivateKey> {
    if blob.kdf.check_bounds().is_err() {
        tracing::warn!("Rejected vault blob with out-of-range cost");
        return Err(Error::WrongPassword);
    }

    let key = kdf::derive_password_key(password.as_bytes(), &blob.salt, &blob.kdf)
        .map_err(|_| Error::WrongPassword)?;

    let plaintext = aead::open(&key, &blob.nonce, &blob.ciphertext, VAULT_AAD)
        .map_err(|_| Error::WrongPassword)?;

    let private_key = PrivateKey::from_slice(&plaintext).ok_or(Error::WrongPassword)?;

    tracing::debug!("Private key unlocked");
    Ok(private_key)
}

/// Re-encrypt the private key under a new password
///
/// The caller replaces the stored blob with the returned one in a single
/// write; the old blob stays valid until then.
pub fn change_password(
    ctx: &CryptoContext,
    blob: &EncryptedPrivateKey,
    old_password: &str,
    new_password: &str,
) -> Result<EncryptedPrivateKey> {
    let private_key = unlock(ctx, blob, old_password)?;
    let replacement = lock(ctx, private_key, new_password)?;

    tracing::info!("Vault password changed");
    Ok(replacement)
}

/// [`lock`] on tokio's blocking pool
pub async fn lock_in_background(
    ctx: CryptoContext,
    private_key: PrivateKey,
    password: Zeroizing<String>,
) -> Result<EncryptedPrivateKey> {
    tokio::task::spawn_blocking(move || lock(&ctx, private_key, &password))
        .await
        .map_err(|e| Error::Internal(format!("vault task failed: {}", e)))?
}

/// [`unlock`] on tokio's blocking pool
pub async fn unlock_in_background(
    ctx: CryptoContext,
    blob: EncryptedPrivateKey,
    password: Zeroizing<String>,
) -> Result<PrivateKey> {
    tokio::task::spawn_blocking(move || unlock(&ctx, &blob, &password))
        .await
        .map_err(|e| Error::Internal(format!("vault task failed: {}", e)))?
}

// ============================================================================
// TESTS
// ============================================================================
