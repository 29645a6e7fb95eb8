//! # Identity Generator
//!
//! Produces the X25519 key pair a user messages with. Runs once per
//! identity, at signup.
//!
//! ## Identity Creation Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  generate_identity(ctx)                                                 │
//! │        │                                                                │
//! │        ├──► PublicKey  ──► profile store (publicKey)                    │
//! │        │                                                                │
//! │        └──► PrivateKey ──► vault::lock(password) ──► profile store      │
//! │                             (private key dropped and zeroized)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing RNG aborts with `RandomnessUnavailable`; there is no weaker
//! fallback.

use crate::context::CryptoContext;
use crate::crypto::{IdentityKeyPair, PrivateKey};
use crate::error::Result;

/// Generate a fresh identity key pair
pub fn generate_identity(_ctx: &CryptoContext) -> Result<IdentityKeyPair> {
    let private = PrivateKey::generate()?;
    let public = private.public_key();

    tracing::info!(fingerprint = %public.fingerprint(), "Generated identity key pair");

    Ok(IdentityKeyPair { public, private })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique() {
        let ctx = CryptoContext::with_defaults().unwrap();
        let a = generate_identity(&ctx).unwrap();
        let b = generate_identity(&ctx).unwrap();

        assert_ne!(a.public, b.public);
        assert_ne!(a.private.as_bytes(), b.private.as_bytes());
    }

    #[test]
    fn test_public_half_matches_private_half() {
        let ctx = CryptoContext::with_defaults().unwrap();
        let (public, private) = generate_identity(&ctx).unwrap().into_parts();
        assert_eq!(private.public_key(), public);
    }
}
