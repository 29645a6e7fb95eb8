//! Hush CLI
//!
//! A terminal front end for the Hush core. Plays the part of the app
//! around the core:
//!
//! 1. **keygen**: create an identity and lock its private key under a
//!    password, writing the profile record (`publicKey`,
//!    `privateKeyEncrypted`) to a JSON file.
//!
//! 2. **seal**: encrypt a message for a recipient's profile record and
//!    print it, or append it to an inbox file.
//!
//! 3. **open**: unlock an inbox with the password and print every message,
//!    with a placeholder for anything that fails to decrypt. Ctrl-C
//!    during the unlock cancels it; Ctrl-C afterwards exits.
//!
//! 4. **passwd**: re-lock the private key under a new password.
//!
//! Only ciphertext and the password-locked key ever touch disk.

mod interrupt;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use zeroize::Zeroizing;

use hush_core::{
    generate_identity, message::select_inbox, message::INBOX_PAGE_SIZE, vault,
    CoreConfig, CryptoContext, EncryptedMessage, Error, InboxSession, KdfParams, MessageBody,
    UserKeyRecord,
};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hush", version, about = "End-to-end encrypted direct messages")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON file with core settings (kdf, idleTimeoutSecs, parallelBatchThreshold)
    #[arg(long, global = true, env = "HUSH_CONFIG")]
    config: Option<PathBuf>,

    /// Argon2id memory cost in KiB for newly locked keys
    #[arg(long, global = true, env = "HUSH_KDF_MEMORY_KIB")]
    kdf_memory_kib: Option<u32>,

    /// Argon2id pass count for newly locked keys
    #[arg(long, global = true, env = "HUSH_KDF_ITERATIONS")]
    kdf_iterations: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an identity and write its key record
    Keygen {
        /// Where to write the key record
        #[arg(long)]
        out: PathBuf,

        /// Overwrite an existing key record
        #[arg(long)]
        force: bool,
    },

    /// Encrypt a message for a recipient
    Seal {
        /// Recipient's key record (only the public key is read)
        #[arg(long)]
        to: PathBuf,

        /// Sender user ID
        #[arg(long)]
        from: String,

        /// Recipient user ID
        #[arg(long)]
        recipient: String,

        /// Message text
        #[arg(long)]
        message: String,

        /// Append to this inbox file instead of printing
        #[arg(long)]
        inbox: Option<PathBuf>,
    },

    /// Unlock and read an inbox
    Open {
        /// Own key record
        #[arg(long)]
        key: PathBuf,

        /// Inbox file (JSON array of messages)
        #[arg(long)]
        inbox: PathBuf,

        /// Only show messages addressed to this user ID
        #[arg(long)]
        user: Option<String>,

        /// Maximum number of messages to show
        #[arg(long, default_value_t = INBOX_PAGE_SIZE)]
        limit: usize,

        /// Mark shown messages as read in the inbox file
        #[arg(long)]
        mark_read: bool,
    },

    /// Change the password protecting a key record
    Passwd {
        /// Key record to re-lock
        #[arg(long)]
        key: PathBuf,
    },
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hush=info,hush_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CryptoContext::initialize(build_config(&cli.config)?)?;

    match cli.command {
        Command::Keygen { out, force } => keygen(&ctx, out, force).await,
        Command::Seal {
            to,
            from,
            recipient,
            message,
            inbox,
        } => seal(&ctx, to, &from, &recipient, &message, inbox),
        Command::Open {
            key,
            inbox,
            user,
            limit,
            mark_read,
        } => open(&ctx, key, inbox, user, limit, mark_read).await,
        Command::Passwd { key } => passwd(&ctx, key).await,
    }
}

fn build_config(args: &ConfigArgs) -> Result<CoreConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            CoreConfig::from_json(&json)?
        }
        None => CoreConfig::default(),
    };

    if args.kdf_memory_kib.is_some() || args.kdf_iterations.is_some() {
        config.kdf = KdfParams::new(
            args.kdf_memory_kib.unwrap_or(config.kdf.m_cost_kib),
            args.kdf_iterations.unwrap_or(config.kdf.t_cost),
            config.kdf.p_cost,
        )?;
    }

    tracing::debug!(
        m_cost_kib = config.kdf.m_cost_kib,
        t_cost = config.kdf.t_cost,
        from_file = args.config.is_some(),
        "CLI configuration resolved"
    );
    Ok(config)
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn keygen(ctx: &CryptoContext, out: PathBuf, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }

    let password = prompt_new_password()?;
    let (public_key, private_key) = generate_identity(ctx)?.into_parts();
    let private_key_encrypted = vault::lock_in_background(ctx.clone(), private_key, password).await?;

    let record = UserKeyRecord {
        public_key,
        private_key_encrypted,
    };
    store::write_json_atomic(&out, &record)?;

    println!("Identity written to {}", out.display());
    println!("Fingerprint: {}", public_key.fingerprint());
    Ok(())
}

fn seal(
    ctx: &CryptoContext,
    to: PathBuf,
    from: &str,
    recipient: &str,
    text: &str,
    inbox: Option<PathBuf>,
) -> Result<()> {
    let record: UserKeyRecord = store::read_json(&to)?;
    let message = EncryptedMessage::compose(ctx, from, recipient, text, &record.public_key)?;

    match inbox {
        Some(path) => {
            let mut messages: Vec<EncryptedMessage> = store::read_json_list(&path)?;
            messages.push(message);
            store::write_json_atomic(&path, &messages)?;
            println!("Appended to {} ({} messages)", path.display(), messages.len());
        }
        None => println!("{}", serde_json::to_string_pretty(&message)?),
    }
    Ok(())
}

async fn open(
    ctx: &CryptoContext,
    key: PathBuf,
    inbox: PathBuf,
    user: Option<String>,
    limit: usize,
    mark_read: bool,
) -> Result<()> {
    let record: UserKeyRecord = store::read_json(&key)?;
    let messages: Vec<EncryptedMessage> = store::read_json_list(&inbox)?;

    let shown: Vec<EncryptedMessage> = match &user {
        Some(user) => select_inbox(&messages, user, limit)
            .into_iter()
            .cloned()
            .collect(),
        None => {
            let mut all = messages.clone();
            all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            all.truncate(limit);
            all
        }
    };

    let session = InboxSession::new(ctx, record.private_key_encrypted);
    let password = prompt_password("Password: ")?;

    let interrupts = Arc::new(interrupt::InterruptHandler::default());
    let watcher = interrupt::watch(Arc::clone(&interrupts));
    let result = read_inbox(
        &session,
        &interrupts,
        password,
        &shown,
        &inbox,
        messages,
        mark_read,
    )
    .await;
    watcher.abort();
    result
}

/// Unlock, print and optionally mark read, with Ctrl-C routed through
/// `interrupts` the whole time
async fn read_inbox(
    session: &InboxSession,
    interrupts: &interrupt::InterruptHandler,
    password: Zeroizing<String>,
    shown: &[EncryptedMessage],
    inbox: &Path,
    mut messages: Vec<EncryptedMessage>,
    mark_read: bool,
) -> Result<()> {
    let signal = interrupts.begin_unlock();
    let unlocked = session.unlock_cancellable(password, signal).await;
    interrupts.unlock_finished();

    match unlocked {
        Ok(()) => {}
        Err(Error::WrongPassword) => bail!("wrong password"),
        Err(Error::Cancelled) => bail!("unlock cancelled"),
        Err(e) => return Err(e.into()),
    }

    let entries = session.inbox_view(shown)?;
    session.lock();

    if entries.is_empty() {
        println!("Inbox is empty.");
    }
    for entry in &entries {
        let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "?".into());
        let marker = if entry.read { ' ' } else { '*' };
        println!("{} [{}] {}: {}", marker, when, entry.sender_id, entry.body.display());
    }

    if mark_read {
        let opened: Vec<&str> = entries
            .iter()
            .filter(|e| matches!(e.body, MessageBody::Plaintext(_)))
            .map(|e| e.id.as_str())
            .collect();
        for message in messages.iter_mut().filter(|m| opened.contains(&m.id.as_str())) {
            message.mark_read();
        }
        store::write_json_atomic(inbox, &messages)?;
    }

    Ok(())
}

async fn passwd(ctx: &CryptoContext, key: PathBuf) -> Result<()> {
    let mut record: UserKeyRecord = store::read_json(&key)?;

    let old = prompt_password("Current password: ")?;
    let new = prompt_new_password()?;

    let blob = record.private_key_encrypted.clone();
    let worker = ctx.clone();
    let replaced = tokio::task::spawn_blocking(move || {
        vault::change_password(&worker, &blob, &old, &new)
    })
    .await
    .map_err(|e| eyre!("password change task failed: {}", e))?;

    record.private_key_encrypted = match replaced {
        Ok(blob) => blob,
        Err(Error::WrongPassword) => bail!("wrong password"),
        Err(e) => return Err(e.into()),
    };
    store::write_json_atomic(&key, &record)?;

    println!("Password changed for {}", key.display());
    Ok(())
}

// ── Prompts ───────────────────────────────────────────────────────────────────

fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .wrap_err("failed to read password")
}

fn prompt_new_password() -> Result<Zeroizing<String>> {
    let password = prompt_password("New password: ")?;
    if password.is_empty() {
        bail!("password must not be empty");
    }
    let confirm = prompt_password("Confirm password: ")?;
    if *password != *confirm {
        bail!("passwords do not match");
    }
    Ok(password)
}
