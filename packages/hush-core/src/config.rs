//! # Configuration
//!
//! Cost parameters for the password KDF and session policy knobs.
//!
//! ## Argon2id Cost
//!
//! | Parameter | Default | Meaning |
//! |-----------|---------|---------|
//! | `m_cost_kib` | 65 536 | Memory usage in KiB (64 MiB) |
//! | `t_cost` | 3 | Number of passes |
//! | `p_cost` | 1 | Degree of parallelism |
//!
//! The default is the one fixed production set. It costs a few hundred
//! milliseconds on commodity hardware. Encrypted key blobs record the
//! parameters they were sealed with, so raising the default later does
//! not lock anyone out of an older blob.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of the symmetric key produced by the password KDF
pub const DERIVED_KEY_SIZE: usize = 32;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Number of passes over memory
    pub t_cost: u32,
    /// Number of lanes
    pub p_cost: u32,
}

impl KdfParams {
    /// Production memory cost (64 MiB)
    pub const DEFAULT_M_COST_KIB: u32 = 64 * 1024;
    /// Production pass count
    pub const DEFAULT_T_COST: u32 = 3;
    /// Production lane count
    pub const DEFAULT_P_COST: u32 = 1;

    /// Largest memory cost accepted (1 GiB)
    pub const MAX_M_COST_KIB: u32 = 1024 * 1024;
    /// Largest pass count accepted
    pub const MAX_T_COST: u32 = 16;
    /// Largest lane count accepted
    pub const MAX_P_COST: u32 = 16;
    /// Largest memory × passes product accepted, in KiB
    pub const MAX_TOTAL_COST_KIB: u64 = 4 * 1024 * 1024;

    /// Build and validate a parameter set
    ///
    /// Anything Argon2 itself refuses (zero passes, less than 8 KiB per
    /// lane, ...) or anything above the `MAX_*` bounds is rejected here
    /// with `InvalidConfig`.
    pub fn new(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Self {
            m_cost_kib,
            t_cost,
            p_cost,
        };
        params.to_argon2()?;
        Ok(params)
    }

    /// Check the parameters against the `MAX_*` bounds
    ///
    /// Runs on a stored blob's parameters before any derivation.
    pub fn check_bounds(&self) -> Result<()> {
        let total = u64::from(self.m_cost_kib) * u64::from(self.t_cost);
        if self.m_cost_kib > Self::MAX_M_COST_KIB
            || self.t_cost > Self::MAX_T_COST
            || self.p_cost > Self::MAX_P_COST
            || total > Self::MAX_TOTAL_COST_KIB
        {
            return Err(Error::InvalidConfig(format!(
                "Argon2 cost m={} KiB t={} p={} exceeds the supported maximum",
                self.m_cost_kib, self.t_cost, self.p_cost
            )));
        }
        Ok(())
    }

    /// Convert to the `argon2` crate's parameter type
    pub(crate) fn to_argon2(&self) -> Result<argon2::Params> {
        self.check_bounds()?;
        argon2::Params::new(
            self.m_cost_kib,
            self.t_cost,
            self.p_cost,
            Some(DERIVED_KEY_SIZE),
        )
        .map_err(|e| Error::InvalidConfig(format!("invalid Argon2 parameters: {}", e)))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: Self::DEFAULT_M_COST_KIB,
            t_cost: Self::DEFAULT_T_COST,
            p_cost: Self::DEFAULT_P_COST,
        }
    }
}

/// Configuration for a [`crate::CryptoContext`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Cost used when sealing new private key blobs
    pub kdf: KdfParams,

    /// Lock an unlocked inbox after this many idle seconds
    ///
    /// `None` leaves re-locking entirely to the surrounding app.
    pub idle_timeout_secs: Option<u64>,

    /// Batches at least this large are decrypted on the rayon pool
    pub parallel_batch_threshold: usize,
}

impl CoreConfig {
    /// Idle timeout as a `Duration`
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Parse a configuration from JSON
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        self.kdf.to_argon2()?;
        if self.parallel_batch_threshold == 0 {
            return Err(Error::InvalidConfig(
                "parallel_batch_threshold must be at least 1".into(),
            ));
        }
        if self.idle_timeout_secs == Some(0) {
            return Err(Error::InvalidConfig("idle timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            idle_timeout_secs: None,
            parallel_batch_threshold: 32,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_production_cost() {
        let params = KdfParams::default();
        assert_eq!(params.m_cost_kib, 65_536);
        assert_eq!(params.t_cost, 3);
        assert_eq!(params.p_cost, 1);
        assert!(params.to_argon2().is_ok());
    }

    #[test]
    fn test_zero_passes_rejected() {
        assert!(matches!(
            KdfParams::new(1024, 0, 1),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_too_little_memory_rejected() {
        // Argon2 needs at least 8 KiB per lane
        assert!(KdfParams::new(8, 1, 2).is_err());
        assert!(KdfParams::new(16, 1, 2).is_ok());
    }

    #[test]
    fn test_cost_upper_bounds() {
        assert!(KdfParams::new(KdfParams::MAX_M_COST_KIB, 4, 1).is_ok());
        assert!(KdfParams::new(KdfParams::MAX_M_COST_KIB + 1, 1, 1).is_err());
        assert!(KdfParams::new(256, KdfParams::MAX_T_COST + 1, 1).is_err());
        assert!(KdfParams::new(1024, 1, KdfParams::MAX_P_COST + 1).is_err());
        // Each bound alone is fine, the product is not
        assert!(matches!(
            KdfParams::new(KdfParams::MAX_M_COST_KIB, KdfParams::MAX_T_COST, 1),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = CoreConfig::from_json(r#"{ "idleTimeoutSecs": 300 }"#).unwrap();
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.kdf, KdfParams::default());
        assert_eq!(config.parallel_batch_threshold, 32);
    }

    #[test]
    fn test_config_rejects_zero_threshold() {
        let result = CoreConfig::from_json(r#"{ "parallelBatchThreshold": 0 }"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
