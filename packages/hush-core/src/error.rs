//! # Error Handling
//!
//! This module provides the error type shared by every Hush Core operation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Context Errors                                                    │
//! │  │   ├── RandomnessUnavailable - OS RNG failed (fatal)                 │
//! │  │   └── InvalidConfig         - Rejected KDF / session settings       │
//! │  │                                                                      │
//! │  ├── Vault Errors                                                      │
//! │  │   ├── WrongPassword         - Bad password OR corrupted blob        │
//! │  │   └── KeyDerivationFailed   - Argon2 / HKDF failure                 │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── InvalidKey            - Malformed public key                  │
//! │  │   ├── DecryptError          - Authentication failure on a message   │
//! │  │   └── EncryptionFailed      - AEAD refused to seal                  │
//! │  │                                                                      │
//! │  ├── Session Errors                                                    │
//! │  │   ├── SessionLocked         - Operation needs an unlocked session   │
//! │  │   ├── UnlockInProgress      - Another unlock is running             │
//! │  │   └── Cancelled             - Unlock was cancelled                  │
//! │  │                                                                      │
//! │  └── Message / Encoding Errors                                         │
//! │      ├── InvalidMessage        - Empty or oversized message            │
//! │      ├── Encoding              - Bad base64 / wrong field length       │
//! │      └── SerializationError    - JSON failure                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No variant ever carries key material, passwords or plaintext. The
//! `WrongPassword` variant covers both a bad password and a corrupted
//! blob so the vault cannot be used as a password-guessing oracle.

use thiserror::Error;

/// Result type alias for Hush Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Hush Core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Context Errors (100-199)
    // ========================================================================

    /// The operating system could not provide secure randomness
    #[error("Secure randomness is unavailable.")]
    RandomnessUnavailable,

    /// The supplied configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Vault Errors (200-299)
    // ========================================================================

    /// The password is wrong or the encrypted key blob is corrupted
    #[error("Wrong password.")]
    WrongPassword,

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A message failed authentication and cannot be read
    #[error("Message could not be decrypted.")]
    DecryptError,

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // ========================================================================
    // Session Errors (400-499)
    // ========================================================================

    /// The inbox session is locked
    #[error("Inbox session is locked. Unlock it with your password first.")]
    SessionLocked,

    /// An unlock attempt is already running on this session
    #[error("An unlock is already in progress for this session.")]
    UnlockInProgress,

    /// The unlock was cancelled before it finished
    #[error("Unlock was cancelled.")]
    Cancelled,

    // ========================================================================
    // Message Errors (500-599)
    // ========================================================================

    /// Invalid message content or addressing
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A stored field could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Context
    /// - 200-299: Vault
    /// - 300-399: Crypto
    /// - 400-499: Session
    /// - 500-599: Messages
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::RandomnessUnavailable => 100,
            Error::InvalidConfig(_) => 101,

            Error::WrongPassword => 200,
            Error::KeyDerivationFailed(_) => 201,

            Error::InvalidKey(_) => 300,
            Error::DecryptError => 301,
            Error::EncryptionFailed(_) => 302,

            Error::SessionLocked => 400,
            Error::UnlockInProgress => 401,
            Error::Cancelled => 402,

            Error::InvalidMessage(_) => 500,
            Error::Encoding(_) => 501,

            Error::SerializationError(_) => 900,
            Error::Internal(_) => 901,
        }
    }

    /// Check if this error is recoverable
    ///
    /// `RandomnessUnavailable` is the only error that must abort the
    /// surrounding flow outright.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::RandomnessUnavailable | Error::Internal(_))
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Error::WrongPassword | Error::SessionLocked)
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Encoding(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
