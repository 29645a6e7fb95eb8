//! Explicit crypto context.
//!
//! Every core operation takes a `&CryptoContext`. Creating one validates
//! the configuration and probes the OS RNG, so a broken entropy source is
//! caught before the first identity is generated rather than halfway
//! through a signup.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::crypto::random;
use crate::error::Result;

/// Initialized capability handed to every core operation
///
/// Cheap to clone; clones share the same configuration.
#[derive(Debug, Clone)]
pub struct CryptoContext {
    config: Arc<CoreConfig>,
}

impl CryptoContext {
    /// Validate `config` and check that secure randomness is available
    pub fn initialize(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let mut probe = [0u8; 32];
        random::fill(&mut probe)?;

        tracing::debug!(
            m_cost_kib = config.kdf.m_cost_kib,
            t_cost = config.kdf.t_cost,
            p_cost = config.kdf.p_cost,
            idle_timeout_secs = ?config.idle_timeout_secs,
            "Crypto context initialized"
        );

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Context with the default production configuration
    pub fn with_defaults() -> Result<Self> {
        Self::initialize(CoreConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}
