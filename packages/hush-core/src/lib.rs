//! # Hush Core
//!
//! End-to-end encryption core for direct messages. The server stores only
//! ciphertext and a password-locked private key; every plaintext exists on
//! the recipient's device alone.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          HUSH CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │    Vault    │  │   Cipher    │  │    Inbox     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - X25519    │  │ - Argon2id  │  │ - Ephemeral │  │ - Lock state │   │
//! │  │   keypair   │  │ - Lock /    │  │   X25519    │  │ - Batch      │   │
//! │  │             │  │   unlock    │  │ - XChaCha20 │  │   decrypt    │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Crypto    │  │   Context   │ │ │           Message               ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - Key types │  │ - Config    │◄┘ │ - Stored record (base64 JSON)  ││
//! │  │ - AEAD, KDF │  │ - RNG probe │   │ - Profile key record           ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error type for the entire library
//! - [`config`] - KDF cost and session policy
//! - [`context`] - Explicit initialization handed to every operation
//! - [`crypto`] - Key types and primitives
//! - [`identity`] - Identity key pair generation
//! - [`vault`] - Password-locked private key
//! - [`cipher`] - Per-message public-key encryption
//! - [`message`] - Records exchanged with the profile and message stores
//! - [`inbox`] - Locked/unlocked session and batch decryption
//! - [`encoding`] - Base64 at the store boundary
//!
//! ## Quick Start
//!
//! ```no_run
//! use hush_core::{
//!     generate_identity, vault, CryptoContext, EncryptedMessage, InboxSession,
//! };
//!
//! # fn main() -> hush_core::Result<()> {
//! let ctx = CryptoContext::with_defaults()?;
//!
//! // Signup
//! let (public, private) = generate_identity(&ctx)?.into_parts();
//! let blob = vault::lock(&ctx, private, "correct horse")?;
//!
//! // Someone sends a message
//! let message = EncryptedMessage::compose(&ctx, "alice", "bob", "hello", &public)?;
//!
//! // Reading the inbox
//! let session = InboxSession::new(&ctx, blob);
//! session.unlock("correct horse")?;
//! for entry in session.inbox_view(&[message])? {
//!     println!("{}: {}", entry.sender_id, entry.body.display());
//! }
//! session.lock();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod cipher;
pub mod config;
pub mod context;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod inbox;
pub mod message;
pub mod vault;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use cipher::{decrypt_with, encrypt_for, SealedMessage};
pub use config::{CoreConfig, KdfParams};
pub use context::CryptoContext;
pub use crypto::{IdentityKeyPair, Nonce, PrivateKey, PublicKey, Salt};
pub use error::{Error, Result};
pub use identity::generate_identity;
pub use inbox::{
    cancel_pair, CancelSignal, Canceller, InboxEntry, InboxSession, MessageBody, SessionState,
};
pub use message::{EncryptedMessage, UserKeyRecord};
pub use vault::EncryptedPrivateKey;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
