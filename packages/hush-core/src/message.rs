//! # Message Records
//!
//! The shapes the profile and message stores hold. Everything here is
//! ciphertext or public data; the stores never interpret the contents.
//!
//! ## Stored Message
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "id":                 "6f1c…",       UUID v4                         │
//! │    "senderId":           "alice",                                      │
//! │    "recipientId":        "bob",                                        │
//! │    "ciphertext":         base64,        message || tag                 │
//! │    "ephemeralPublicKey": base64(32),                                   │
//! │    "nonce":              base64(24),                                   │
//! │    "timestamp":          1718000000000, Unix millis                    │
//! │    "read":               false                                         │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cipher::{encrypt_for, SealedMessage};
use crate::context::CryptoContext;
use crate::crypto::{Nonce, PublicKey};
use crate::encoding::base64_vec;
use crate::error::{Error, Result};
use crate::vault::EncryptedPrivateKey;

/// Largest plaintext accepted by [`EncryptedMessage::compose`] (64 KiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Number of messages an inbox shows at once
pub const INBOX_PAGE_SIZE: usize = 50;

/// A message as persisted by the message store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedMessage {
    /// Unique message ID
    pub id: String,
    /// Sender's user ID
    pub sender_id: String,
    /// Recipient's user ID
    pub recipient_id: String,
    /// Ciphertext with tag
    #[serde(with = "base64_vec")]
    pub ciphertext: Vec<u8>,
    /// Single-use sender public key
    pub ephemeral_public_key: PublicKey,
    /// Per-message nonce
    pub nonce: Nonce,
    /// Send time, Unix milliseconds
    pub timestamp: i64,
    /// Whether the recipient has opened it
    #[serde(default)]
    pub read: bool,
}

impl EncryptedMessage {
    /// Encrypt `plaintext` for `recipient_public_key` and wrap it in a
    /// storable record
    pub fn compose(
        ctx: &CryptoContext,
        sender_id: &str,
        recipient_id: &str,
        plaintext: &str,
        recipient_public_key: &PublicKey,
    ) -> Result<Self> {
        if sender_id.trim().is_empty() {
            return Err(Error::InvalidMessage("sender id is required".into()));
        }
        if recipient_id.trim().is_empty() {
            return Err(Error::InvalidMessage("recipient id is required".into()));
        }
        if plaintext.is_empty() {
            return Err(Error::InvalidMessage("message body is required".into()));
        }
        if plaintext.len() > MAX_MESSAGE_SIZE {
            return Err(Error::InvalidMessage(format!(
                "message is {} bytes, limit is {}",
                plaintext.len(),
                MAX_MESSAGE_SIZE
            )));
        }

        let SealedMessage {
            ciphertext,
            ephemeral_public_key,
            nonce,
        } = encrypt_for(ctx, plaintext, recipient_public_key)?;

        let message = Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            ciphertext,
            ephemeral_public_key,
            nonce,
            timestamp: Utc::now().timestamp_millis(),
            read: false,
        };

        tracing::info!(
            id = %message.id,
            recipient = %recipient_public_key.fingerprint(),
            size = message.ciphertext.len(),
            "Message composed"
        );

        Ok(message)
    }

    /// Send time as a UTC datetime
    ///
    /// `None` if the stored timestamp is out of chrono's range.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Flag the message as opened
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

/// Pick the messages an inbox shows: those addressed to `recipient_id`,
/// newest first, at most `limit`
pub fn select_inbox<'a>(
    messages: &'a [EncryptedMessage],
    recipient_id: &str,
    limit: usize,
) -> Vec<&'a EncryptedMessage> {
    let mut selected: Vec<&EncryptedMessage> = messages
        .iter()
        .filter(|m| m.recipient_id == recipient_id)
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected.truncate(limit);
    selected
}

/// Key material kept on a user's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyRecord {
    /// Identity public key
    pub public_key: PublicKey,
    /// Password-locked identity private key
    pub private_key_encrypted: EncryptedPrivateKey,
}

impl UserKeyRecord {
    /// Parse from the profile store's JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for the profile store
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
