//! # Inbox Session
//!
//! Holds the unlocked identity key for the lifetime of one inbox view and
//! decrypts messages with it.
//!
//! ## State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                unlock(password)                                         │
//! │   ┌────────┐ ──────────────────► ┌───────────┐                         │
//! │   │ Locked │                      │ Unlocking │  (KDF running)          │
//! │   └────────┘ ◄────────────────── └───────────┘                         │
//! │       ▲       WrongPassword /          │                                │
//! │       │       cancelled / lock()       │ key recovered                  │
//! │       │                                ▼                                │
//! │       │                          ┌──────────┐                          │
//! │       └───────────────────────── │ Unlocked │ ◄── decrypt_batch(..)    │
//! │          lock() / idle timeout   └──────────┘                          │
//! │          (key + cache discarded)                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Locked → Unlocking` transition happens under a mutex, so only one
//! unlock can be in flight per session; a second caller gets
//! `UnlockInProgress`. The KDF itself runs outside the mutex.
//!
//! ## Cancellation
//!
//! [`InboxSession::unlock_cancellable`] races the KDF (on tokio's blocking
//! pool) against a [`CancelSignal`]. Argon2 cannot be interrupted midway;
//! on cancellation the session returns to `Locked` immediately and the
//! key the background task eventually produces is dropped and zeroized
//! without ever being stored. Calling [`InboxSession::lock`] during an
//! unlock has the same effect, and dropping the unlock future also returns
//! the session to `Locked`.
//!
//! A session runs at most one derivation at a time. Until an abandoned
//! derivation has actually finished, new unlocks get `UnlockInProgress`
//! even though the state reads `Locked`, so repeated unlock and cancel
//! cannot pile up KDF work on the blocking pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use tokio::sync::watch;
use zeroize::Zeroizing;

use crate::cipher::decrypt_with;
use crate::context::CryptoContext;
use crate::crypto::PrivateKey;
use crate::error::{Error, Result};
use crate::message::EncryptedMessage;
use crate::vault::{self, EncryptedPrivateKey};

/// Text shown in place of a message that failed to decrypt
pub const UNDECRYPTABLE_PLACEHOLDER: &str = "Unable to decrypt this message";

// ============================================================================
// STATE
// ============================================================================

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No key held
    Locked,
    /// Key derivation in progress
    Unlocking,
    /// Key held, messages can be decrypted
    Unlocked,
}

enum Inner {
    Locked,
    Unlocking { attempt: u64 },
    Unlocked(UnlockedState),
}

struct UnlockedState {
    key: PrivateKey,
    cache: HashMap<String, Zeroizing<String>>,
    last_activity: Instant,
}

impl Inner {
    fn state(&self) -> SessionState {
        match self {
            Inner::Locked => SessionState::Locked,
            Inner::Unlocking { .. } => SessionState::Unlocking,
            Inner::Unlocked(_) => SessionState::Unlocked,
        }
    }

    fn is_attempt(&self, id: u64) -> bool {
        matches!(self, Inner::Unlocking { attempt } if *attempt == id)
    }
}

/// One in-flight unlock
///
/// Dropping it without calling `finish` puts the session back to `Locked`
/// if it is still this attempt's turn.
struct Attempt<'a> {
    inner: &'a Mutex<Inner>,
    id: u64,
    finished: bool,
}

impl Attempt<'_> {
    fn finish(mut self, outcome: Result<PrivateKey>) -> Result<()> {
        self.finished = true;
        let mut inner = self.inner.lock();

        if !inner.is_attempt(self.id) {
            tracing::debug!(attempt = self.id, "Unlock superseded by lock()");
            return Err(Error::Cancelled);
        }

        match outcome {
            Ok(key) => {
                *inner = Inner::Unlocked(UnlockedState {
                    key,
                    cache: HashMap::new(),
                    last_activity: Instant::now(),
                });
                tracing::info!(attempt = self.id, "Inbox unlocked");
                Ok(())
            }
            Err(e) => {
                *inner = Inner::Locked;
                tracing::info!(attempt = self.id, error_code = e.code(), "Inbox unlock failed");
                Err(e)
            }
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.is_attempt(self.id) {
            *inner = Inner::Locked;
            tracing::info!(attempt = self.id, "Inbox unlock abandoned");
        }
    }
}

/// Marks a key derivation as running until dropped
///
/// Owned by whoever runs the KDF, which outlives the [`Attempt`] when an
/// unlock is cancelled.
struct Derivation(Arc<AtomicBool>);

impl Drop for Derivation {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (Canceller, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx }, CancelSignal { rx })
}

/// Trigger side of a cancellation pair
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side of a cancellation pair
///
/// If the [`Canceller`] is dropped without firing, the signal never fires.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

// ============================================================================
// VIEW TYPES
// ============================================================================

/// Body of an inbox entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Decrypted text
    Plaintext(Zeroizing<String>),
    /// Decryption failed; the content is unrecoverable with this key
    Undecryptable,
}

impl MessageBody {
    /// Text to render: the plaintext or the placeholder
    pub fn display(&self) -> &str {
        match self {
            MessageBody::Plaintext(text) => text.as_str(),
            MessageBody::Undecryptable => UNDECRYPTABLE_PLACEHOLDER,
        }
    }
}

/// One row of a rendered inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    /// Message ID
    pub id: String,
    /// Sender's user ID
    pub sender_id: String,
    /// Send time, Unix milliseconds
    pub timestamp: i64,
    /// Read flag as stored
    pub read: bool,
    /// Decrypted text or placeholder
    pub body: MessageBody,
}

// ============================================================================
// SESSION
// ============================================================================

/// An inbox bound to one encrypted identity key
pub struct InboxSession {
    ctx: CryptoContext,
    blob: EncryptedPrivateKey,
    inner: Mutex<Inner>,
    next_attempt: AtomicU64,
    deriving: Arc<AtomicBool>,
}

impl std::fmt::Debug for InboxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl InboxSession {
    /// Create a locked session for `blob`
    pub fn new(ctx: &CryptoContext, blob: EncryptedPrivateKey) -> Self {
        Self {
            ctx: ctx.clone(),
            blob,
            inner: Mutex::new(Inner::Locked),
            next_attempt: AtomicU64::new(1),
            deriving: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    /// Unlock on the current thread
    ///
    /// Blocks for the duration of the KDF. Already unlocked is a no-op.
    pub fn unlock(&self, password: &str) -> Result<()> {
        let Some((attempt, derivation)) = self.begin_unlock()? else {
            return Ok(());
        };
        let outcome = vault::unlock(&self.ctx, &self.blob, password);
        drop(derivation);
        attempt.finish(outcome)
    }

    /// Unlock with the KDF on tokio's blocking pool, abandoning it if
    /// `cancel` fires first
    ///
    /// An abandoned KDF keeps running to completion; the session refuses
    /// new unlocks with `UnlockInProgress` until it has.
    pub async fn unlock_cancellable(
        &self,
        password: Zeroizing<String>,
        mut cancel: CancelSignal,
    ) -> Result<()> {
        let Some((attempt, derivation)) = self.begin_unlock()? else {
            return Ok(());
        };

        if cancel.is_cancelled() {
            drop(derivation);
            drop(attempt);
            return Err(Error::Cancelled);
        }

        let ctx = self.ctx.clone();
        let blob = self.blob.clone();
        let derive = tokio::task::spawn_blocking(move || {
            let _derivation = derivation;
            vault::unlock(&ctx, &blob, &password)
        });

        tokio::select! {
            joined = derive => {
                let outcome = joined
                    .map_err(|e| Error::Internal(format!("vault task failed: {}", e)))
                    .and_then(|outcome| outcome);
                attempt.finish(outcome)
            }
            _ = cancel.cancelled() => {
                drop(attempt);
                tracing::info!("Inbox unlock cancelled");
                Err(Error::Cancelled)
            }
        }
    }

    fn begin_unlock(&self) -> Result<Option<(Attempt<'_>, Derivation)>> {
        let mut inner = self.inner.lock();
        match *inner {
            Inner::Unlocked(_) => Ok(None),
            Inner::Unlocking { .. } => Err(Error::UnlockInProgress),
            Inner::Locked => {
                if self.deriving.swap(true, Ordering::AcqRel) {
                    tracing::debug!("Previous key derivation still running");
                    return Err(Error::UnlockInProgress);
                }
                let id = self.next_attempt.fetch_add(1, Ordering::Relaxed);
                *inner = Inner::Unlocking { attempt: id };
                tracing::debug!(attempt = id, "Inbox unlocking");
                Ok(Some((
                    Attempt {
                        inner: &self.inner,
                        id,
                        finished: false,
                    },
                    Derivation(Arc::clone(&self.deriving)),
                )))
            }
        }
    }

    /// Discard the key and every cached plaintext
    ///
    /// An unlock in flight finishes with `Cancelled`.
    pub fn lock(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state();
        *inner = Inner::Locked;
        drop(inner);

        if previous != SessionState::Locked {
            tracing::info!(from = ?previous, "Inbox locked");
        }
    }

    /// Decrypt `messages` with the held key
    ///
    /// The outer error is `SessionLocked`. Each slot of the returned vector
    /// matches the message at the same index: a bad message yields
    /// `DecryptError` there without affecting its neighbours.
    pub fn decrypt_batch(
        &self,
        messages: &[EncryptedMessage],
    ) -> Result<Vec<Result<Zeroizing<String>>>> {
        let mut inner = self.inner.lock();
        expire_if_idle(&mut inner, self.ctx.config().idle_timeout(), Instant::now());

        let Inner::Unlocked(session) = &mut *inner else {
            return Err(Error::SessionLocked);
        };

        let ctx = &self.ctx;
        let key = &session.key;
        let decrypt = |m: &EncryptedMessage| {
            decrypt_with(ctx, &m.ciphertext, &m.ephemeral_public_key, &m.nonce, key)
        };

        let parallel = messages.len() >= ctx.config().parallel_batch_threshold;
        let results: Vec<Result<Zeroizing<String>>> = if parallel {
            messages.par_iter().map(decrypt).collect()
        } else {
            messages.iter().map(decrypt).collect()
        };

        let mut failed = 0usize;
        for (message, result) in messages.iter().zip(&results) {
            match result {
                Ok(text) => {
                    session.cache.insert(message.id.clone(), text.clone());
                }
                Err(_) => failed += 1,
            }
        }
        session.last_activity = Instant::now();

        tracing::debug!(total = messages.len(), failed, parallel, "Decrypted batch");
        Ok(results)
    }

    /// Previously decrypted text for `id`, if any
    pub fn plaintext(&self, id: &str) -> Result<Option<Zeroizing<String>>> {
        let mut inner = self.inner.lock();
        expire_if_idle(&mut inner, self.ctx.config().idle_timeout(), Instant::now());

        match &*inner {
            Inner::Unlocked(session) => Ok(session.cache.get(id).cloned()),
            _ => Err(Error::SessionLocked),
        }
    }

    /// Decrypt `messages` and pair each with its metadata for display
    pub fn inbox_view(&self, messages: &[EncryptedMessage]) -> Result<Vec<InboxEntry>> {
        let results = self.decrypt_batch(messages)?;

        Ok(messages
            .iter()
            .zip(results)
            .map(|(message, result)| InboxEntry {
                id: message.id.clone(),
                sender_id: message.sender_id.clone(),
                timestamp: message.timestamp,
                read: message.read,
                body: match result {
                    Ok(text) => MessageBody::Plaintext(text),
                    Err(_) => MessageBody::Undecryptable,
                },
            })
            .collect())
    }

    /// Record user activity for the idle timeout
    pub fn touch(&self) {
        if let Inner::Unlocked(session) = &mut *self.inner.lock() {
            session.last_activity = Instant::now();
        }
    }

    /// Lock if the session has been idle longer than the configured
    /// timeout; returns whether it locked
    pub fn enforce_idle_timeout(&self) -> bool {
        self.enforce_idle_timeout_at(Instant::now())
    }

    fn enforce_idle_timeout_at(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        expire_if_idle(&mut inner, self.ctx.config().idle_timeout(), now)
    }
}

fn expire_if_idle(inner: &mut Inner, timeout: Option<std::time::Duration>, now: Instant) -> bool {
    let (Some(timeout), Inner::Unlocked(session)) = (timeout, &*inner) else {
        return false;
    };
    if now.saturating_duration_since(session.last_activity) < timeout {
        return false;
    }

    *inner = Inner::Locked;
    tracing::info!(timeout_secs = timeout.as_secs(), "Inbox locked after idle timeout");
    true
}

// ============================================================================
// TESTS
// ============================================================================
