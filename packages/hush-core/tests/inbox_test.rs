//! End-to-end scenarios across identity, vault, cipher and inbox session

use std::sync::Arc;
use std::time::Duration;

use hush_core::{
    cancel_pair, decrypt_with, encrypt_for, generate_identity, vault, CoreConfig, CryptoContext,
    EncryptedMessage, Error, InboxSession, KdfParams, MessageBody, SessionState, UserKeyRecord,
};
use zeroize::Zeroizing;

fn fast_ctx() -> CryptoContext {
    CryptoContext::initialize(CoreConfig {
        kdf: KdfParams::new(256, 1, 1).unwrap(),
        ..CoreConfig::default()
    })
    .unwrap()
}

#[test]
fn test_hello_correct_horse_scenario() {
    let ctx = fast_ctx();
    let (public, private) = generate_identity(&ctx).unwrap().into_parts();

    let sealed = encrypt_for(&ctx, "hello", &public).unwrap();
    let opened = decrypt_with(
        &ctx,
        &sealed.ciphertext,
        &sealed.ephemeral_public_key,
        &sealed.nonce,
        &private,
    )
    .unwrap();
    assert_eq!(opened.as_str(), "hello");

    let original = *private.as_bytes();
    let blob = vault::lock(&ctx, private, "correct horse").unwrap();

    let restored = vault::unlock(&ctx, &blob, "correct horse").unwrap();
    assert_eq!(restored.as_bytes(), &original);

    assert_eq!(
        vault::unlock(&ctx, &blob, "wrong").unwrap_err(),
        Error::WrongPassword
    );
}

#[test]
fn test_batch_with_one_corrupted_message() {
    let ctx = fast_ctx();
    let (public, private) = generate_identity(&ctx).unwrap().into_parts();
    let blob = vault::lock(&ctx, private, "pw").unwrap();

    let first = EncryptedMessage::compose(&ctx, "alice", "bob", "one", &public).unwrap();
    let mut second = EncryptedMessage::compose(&ctx, "carol", "bob", "two", &public).unwrap();
    let third = EncryptedMessage::compose(&ctx, "dave", "bob", "three", &public).unwrap();
    let last = second.ciphertext.len() - 1;
    second.ciphertext[last] ^= 0x01;

    let session = InboxSession::new(&ctx, blob);
    session.unlock("pw").unwrap();
    let results = session.decrypt_batch(&[first, second, third]).unwrap();

    let failures = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(failures, 1);
    assert_eq!(results[0].as_ref().unwrap().as_str(), "one");
    assert_eq!(results[1].as_ref().unwrap_err(), &Error::DecryptError);
    assert_eq!(results[2].as_ref().unwrap().as_str(), "three");
}

#[test]
fn test_profile_record_through_json() {
    let ctx = fast_ctx();
    let (public, private) = generate_identity(&ctx).unwrap().into_parts();
    let record = UserKeyRecord {
        public_key: public,
        private_key_encrypted: vault::lock(&ctx, private, "pw").unwrap(),
    };

    let json = record.to_json().unwrap();
    assert!(json.contains("\"publicKey\""));
    assert!(json.contains("\"privateKeyEncrypted\""));
    assert!(json.contains("\"encrypted\""));

    let restored = UserKeyRecord::from_json(&json).unwrap();
    let message = EncryptedMessage::compose(&ctx, "a", "b", "via json", &restored.public_key)
        .unwrap();
    let stored = serde_json::to_string(&message).unwrap();
    let fetched: EncryptedMessage = serde_json::from_str(&stored).unwrap();

    let session = InboxSession::new(&ctx, restored.private_key_encrypted);
    session.unlock("pw").unwrap();
    let view = session.inbox_view(&[fetched]).unwrap();
    assert_eq!(view[0].body, MessageBody::Plaintext(Zeroizing::new("via json".into())));
}

#[test]
fn test_concurrent_sync_unlocks_serialize() {
    let ctx = fast_ctx();
    let (_, private) = generate_identity(&ctx).unwrap().into_parts();
    let session = Arc::new(InboxSession::new(&ctx, vault::lock(&ctx, private, "pw").unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.unlock("pw"))
        })
        .collect();

    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) | Err(Error::UnlockInProgress) => {}
            Err(other) => panic!("unexpected unlock error: {other}"),
        }
    }
    assert_eq!(session.state(), SessionState::Unlocked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_in_flight_unlock() {
    // Production cost so the KDF is still running when the cancel fires
    let ctx = CryptoContext::with_defaults().unwrap();
    let (_, private) = generate_identity(&ctx).unwrap().into_parts();
    let blob = vault::lock_in_background(ctx.clone(), private, Zeroizing::new("pw".into()))
        .await
        .unwrap();
    let session = Arc::new(InboxSession::new(&ctx, blob));

    let (canceller, signal) = cancel_pair();
    let unlocking = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session
                .unlock_cancellable(Zeroizing::new("pw".into()), signal)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(5)).await;
    canceller.cancel();

    assert_eq!(unlocking.await.unwrap().unwrap_err(), Error::Cancelled);
    assert_eq!(session.state(), SessionState::Locked);

    // The abandoned KDF is still running, so a new attempt is refused
    // rather than starting a second derivation next to it
    let (_keep, signal) = cancel_pair();
    let retry = session
        .unlock_cancellable(Zeroizing::new("pw".into()), signal)
        .await;
    assert_eq!(retry.unwrap_err(), Error::UnlockInProgress);
    assert_eq!(session.state(), SessionState::Locked);

    // Usable again once it has finished
    let mut unlocked = false;
    for _ in 0..500 {
        let (_keep, signal) = cancel_pair();
        match session
            .unlock_cancellable(Zeroizing::new("pw".into()), signal)
            .await
        {
            Ok(()) => {
                unlocked = true;
                break;
            }
            Err(Error::UnlockInProgress) => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(other) => panic!("unexpected unlock error: {other}"),
        }
    }
    assert!(unlocked);
    assert_eq!(session.state(), SessionState::Unlocked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_cancel_runs_one_derivation_at_a_time() {
    let ctx = CryptoContext::with_defaults().unwrap();
    let (_, private) = generate_identity(&ctx).unwrap().into_parts();
    let blob = vault::lock_in_background(ctx.clone(), private, Zeroizing::new("pw".into()))
        .await
        .unwrap();
    let session = InboxSession::new(&ctx, blob);

    let mut started = 0;
    for _ in 0..10 {
        let (canceller, signal) = cancel_pair();
        let unlock = session.unlock_cancellable(Zeroizing::new("pw".into()), signal);
        tokio::pin!(unlock);

        // Let the attempt reach the KDF before cancelling it
        let outcome = match tokio::time::timeout(Duration::from_millis(2), &mut unlock).await {
            Ok(outcome) => outcome,
            Err(_) => {
                canceller.cancel();
                unlock.await
            }
        };
        match outcome {
            Err(Error::Cancelled) => started += 1,
            Err(Error::UnlockInProgress) => {}
            other => panic!("unexpected unlock outcome: {other:?}"),
        }
    }

    // Only the first attempt got to spawn a KDF; the rest were refused
    // while it ran
    assert_eq!(started, 1);
    assert_eq!(session.state(), SessionState::Locked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_async_unlock_rejected_while_first_runs() {
    let ctx = CryptoContext::with_defaults().unwrap();
    let (_, private) = generate_identity(&ctx).unwrap().into_parts();
    let blob = vault::lock_in_background(ctx.clone(), private, Zeroizing::new("pw".into()))
        .await
        .unwrap();
    let session = Arc::new(InboxSession::new(&ctx, blob));

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            let (_keep, signal) = cancel_pair();
            session
                .unlock_cancellable(Zeroizing::new("pw".into()), signal)
                .await
        })
    };

    while session.state() == SessionState::Locked {
        tokio::task::yield_now().await;
    }

    let (_keep, signal) = cancel_pair();
    let second = session
        .unlock_cancellable(Zeroizing::new("pw".into()), signal)
        .await;
    assert_eq!(second.unwrap_err(), Error::UnlockInProgress);

    first.await.unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Unlocked);
}
