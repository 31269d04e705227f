//! Mail channel: polls a fetcher for already-fetched raw messages.
//!
//! Talking to the mail server is somebody else's job: an external fetcher
//! (fetchmail, an IMAP sync tool, an MTA delivery rule) drops complete
//! RFC 5322 messages into a spool directory, and [`SpoolFetcher`] picks them
//! up. Messages are left in place; each one is delivered once per process.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::channels::next_tick;
use crate::channels::spool::DirectoryScanner;
use crate::config::interval_ms;
use crate::error::{ChannelError, ConfigError};
use crate::pipeline::types::{Ingress, RawMessage, RawPayload};

// ── Configuration ───────────────────────────────────────────────────

/// Mail channel configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub spool_dir: PathBuf,
    pub poll_interval: Duration,
}

impl MailConfig {
    /// Returns `None` if `RELAY_MAIL_SPOOL` is not set (channel disabled).
    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(spool_dir) = lookup("RELAY_MAIL_SPOOL").filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        Ok(Some(Self {
            spool_dir: PathBuf::from(spool_dir),
            poll_interval: interval_ms(lookup, "RELAY_MAIL_POLL_MS", Duration::from_millis(5000))?,
        }))
    }
}

// ── Fetcher ─────────────────────────────────────────────────────────

/// A raw message handed over by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedMail {
    /// Fetcher-specific identifier, for logs.
    pub id: String,
    pub raw: Vec<u8>,
}

/// Source of already-fetched mail.
#[async_trait]
pub trait MailFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Messages not returned by any previous call.
    async fn fetch_new(&self) -> Result<Vec<FetchedMail>, ChannelError>;
}

/// Reads `*.eml` files from a spool directory.
pub struct SpoolFetcher {
    scanner: Mutex<DirectoryScanner>,
}

impl SpoolFetcher {
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            scanner: Mutex::new(DirectoryScanner::new(spool_dir).with_extension("eml")),
        }
    }

    /// Create the spool directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), ChannelError> {
        let scanner = self.scanner.lock().await;
        scanner.ensure_dir().await.map_err(|e| ChannelError::StartupFailed {
            name: "mail".into(),
            reason: format!("cannot create spool {}: {e}", scanner.dir().display()),
        })
    }
}

#[async_trait]
impl MailFetcher for SpoolFetcher {
    fn name(&self) -> &str {
        "spool"
    }

    async fn fetch_new(&self) -> Result<Vec<FetchedMail>, ChannelError> {
        let mut scanner = self.scanner.lock().await;
        let paths = scanner.scan().await.map_err(|source| ChannelError::Io {
            name: "mail".into(),
            source,
        })?;
        Ok(read_spooled(&mut scanner, paths).await)
    }
}

/// Read each spooled file. A file that cannot be read is logged and left for
/// the next poll; the rest of the batch is still returned.
async fn read_spooled(scanner: &mut DirectoryScanner, paths: Vec<PathBuf>) -> Vec<FetchedMail> {
    let mut mails = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(&path).await {
            Ok(raw) => mails.push(FetchedMail {
                id: path.display().to_string(),
                raw,
            }),
            Err(source) => {
                scanner.forget(&path);
                let err = ChannelError::Read {
                    name: "mail".into(),
                    path,
                    source,
                };
                warn!("Skipping spooled mail until next poll: {err}");
            }
        }
    }
    mails
}

// ── Poller ──────────────────────────────────────────────────────────

/// Spawn a background task that polls `fetcher` and delivers every message.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop polling.
pub fn spawn_mail_poller(
    fetcher: Arc<dyn MailFetcher>,
    poll_interval: Duration,
    ingress: Ingress,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            fetcher = fetcher.name(),
            interval_ms = poll_interval.as_millis() as u64,
            "Mail poller started"
        );

        let mut tick = tokio::time::interval(poll_interval);

        loop {
            if !next_tick(&mut tick, &shutdown).await {
                info!("Mail poller shutting down");
                return;
            }

            if !poll_once(fetcher.as_ref(), &ingress).await {
                info!("Pipeline closed, mail poller stopping");
                return;
            }
        }
    });

    (handle, shutdown_flag)
}

/// Run a single poll cycle. Returns `false` once the pipeline is gone.
async fn poll_once(fetcher: &dyn MailFetcher, ingress: &Ingress) -> bool {
    let mails = match fetcher.fetch_new().await {
        Ok(mails) => mails,
        Err(e) => {
            error!(fetcher = fetcher.name(), "Mail poll failed: {e}");
            return true;
        }
    };

    if !mails.is_empty() {
        debug!(count = mails.len(), "Fetched new mail");
    }

    for mail in mails {
        let message = RawMessage::new(RawPayload::Mail(mail.raw));
        debug!(id = %message.id, source = %mail.id, "Delivering mail");
        if ingress.send(message).await.is_err() {
            return false;
        }
    }
    true
}
