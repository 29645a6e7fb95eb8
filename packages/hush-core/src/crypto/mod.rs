//! # Cryptography Module
//!
//! Primitives used by the identity generator, the password vault and the
//! message cipher.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Password ──► Argon2id ──► Vault Key ──► XChaCha20-Poly1305            │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                              Encrypted identity private key            │
//! │                                                                         │
//! │  Ephemeral X25519 × Recipient X25519 ──► HKDF-SHA256 ──► Box Key       │
//! │                                                            │            │
//! │                                                            ▼            │
//! │                                   XChaCha20-Poly1305(message)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Purpose | Algorithm | Crate |
//! |---------|-----------|-------|
//! | Identity / ephemeral keys | X25519 | `x25519-dalek` |
//! | Password KDF | Argon2id | `argon2` |
//! | Box key derivation | HKDF-SHA256 | `hkdf`, `sha2` |
//! | Authenticated encryption | XChaCha20-Poly1305 | `chacha20poly1305` |
//! | Randomness | OS RNG | `rand` |

pub mod aead;
pub mod kdf;
mod keys;
pub mod random;

pub use aead::{SymmetricKey, TAG_SIZE};
pub use keys::{
    IdentityKeyPair, Nonce, PrivateKey, PublicKey, Salt, KEY_SIZE, NONCE_SIZE, SALT_SIZE,
};
