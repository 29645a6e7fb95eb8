//! Secure randomness.
//!
//! All salts, nonces and secret keys come from the operating system RNG.
//! A failing RNG is surfaced as `RandomnessUnavailable`; there is no
//! fallback source.

use rand::rngs::OsRng;
use rand_core::RngCore;

use crate::error::{Error, Result};

/// Fill `buf` from the operating system RNG
pub fn fill(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        tracing::error!(error = %e, "OS random number generator failed");
        Error::RandomnessUnavailable
    })
}

/// Return `N` fresh random bytes
pub fn array<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    fill(&mut bytes)?;
    Ok(bytes)
}
