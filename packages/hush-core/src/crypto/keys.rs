//! # Key Types
//!
//! Strongly-typed, fixed-size values for everything the core handles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  IdentityKeyPair (X25519)                                       │   │
//! │  │  ────────────────────────                                        │   │
//! │  │                                                                  │   │
//! │  │  • PublicKey: 32 bytes, published in the user's profile         │   │
//! │  │  • PrivateKey: 32 bytes, zeroized on drop, handed straight     │   │
//! │  │    to the password vault and never persisted in the clear      │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Salt (16 bytes)  │  Nonce (24 bytes)                           │   │
//! │  │  ───────────────     ────────────────                            │   │
//! │  │  Argon2id salt        XChaCha20-Poly1305 nonce                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `PrivateKey` deliberately implements neither `Clone`, `Serialize` nor a
//! revealing `Debug`.

use std::fmt;

use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::random;
use crate::encoding::impl_base64_serde;
use crate::error::{Error, Result};

/// Size of an X25519 public or private key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of a vault salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an XChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 24;

/// An X25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub(crate) [u8; KEY_SIZE]);

impl PublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting anything that is not 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "public key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Decode from the store's base64 form
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = crate::encoding::decode(s)
            .map_err(|e| Error::InvalidKey(format!("public key is not base64: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Encode for the store
    pub fn to_base64(&self) -> String {
        crate::encoding::encode(&self.0)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Short hex fingerprint, safe for logs
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..8])
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl_base64_serde!(PublicKey, KEY_SIZE);

/// An X25519 private key
///
/// ## Security
///
/// - Zeroized when dropped
/// - Never logged, serialized or cloned
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl PrivateKey {
    /// Generate a fresh random private key
    pub(crate) fn generate() -> Result<Self> {
        let mut key = Self([0u8; KEY_SIZE]);
        random::fill(&mut key.0)?;
        Ok(key)
    }

    /// Take ownership of raw key bytes
    ///
    /// The caller's copy should be zeroized afterwards.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copy out of a slice, e.g. a decrypted vault buffer
    pub(crate) fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_SIZE {
            return None;
        }
        let mut key = Self([0u8; KEY_SIZE]);
        key.0.copy_from_slice(bytes);
        Some(key)
    }

    /// Get the raw key bytes
    ///
    /// ## Security Warning
    ///
    /// Only use this to feed the vault. Never log or transmit these bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        let secret = self.to_x25519();
        PublicKey(X25519PublicKey::from(&secret).to_bytes())
    }

    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A user's long-lived messaging identity
///
/// The public half goes to the profile store; the private half must go
/// straight into [`crate::vault::lock`].
#[derive(Debug)]
pub struct IdentityKeyPair {
    /// Shared freely
    pub public: PublicKey,
    /// Password-protected at rest
    pub private: PrivateKey,
}

impl IdentityKeyPair {
    /// Split into public and private halves
    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}

/// Random 16-byte salt for the password KDF
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt(pub(crate) [u8; SALT_SIZE]);

impl Salt {
    /// Generate a fresh random salt
    pub fn random() -> Result<Self> {
        Ok(Self(random::array()?))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

impl_base64_serde!(Salt, SALT_SIZE);

/// A 24-byte XChaCha20-Poly1305 nonce
///
/// ## Critical Security Requirement
///
/// **Never reuse a nonce with the same key.** Every nonce in this crate is
/// drawn fresh from the OS RNG; at 192 bits random collisions are not a
/// practical concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Nonce(pub(crate) [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Result<Self> {
        Ok(Self(random::array()?))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice; a wrong length can never authenticate
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| Error::DecryptError)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl_base64_serde!(Nonce, NONCE_SIZE);

// ============================================================================
// TESTS
// ============================================================================
