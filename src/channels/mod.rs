//! Source channels feeding the pipeline.
//!
//! Each channel delivers `RawMessage`s into the pipeline's ingress:
//! - `file`: polls a directory, one message per new file
//! - `web`: `POST` endpoint taking `{"text": ...}`
//! - `mail`: polls a spool of already-fetched RFC 5322 messages

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Interval;

pub mod file;
pub mod mail;
pub mod spool;
pub mod web;

pub use file::{FileChannelConfig, spawn_file_poller};
pub use mail::{MailConfig, MailFetcher, SpoolFetcher, spawn_mail_poller};
pub use spool::DirectoryScanner;
pub use web::WebConfig;

/// How often a waiting poller checks its shutdown flag.
const SHUTDOWN_CHECK: Duration = Duration::from_millis(100);

/// Wait for the next poll tick. Returns `false` as soon as `shutdown` is set,
/// without waiting out the rest of the interval.
pub(crate) async fn next_tick(tick: &mut Interval, shutdown: &AtomicBool) -> bool {
    let mut check = tokio::time::interval(SHUTDOWN_CHECK);
    loop {
        tokio::select! {
            _ = tick.tick() => return !shutdown.load(Ordering::Relaxed),
            _ = check.tick() => {
                if shutdown.load(Ordering::Relaxed) {
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn next_tick_returns_early_on_shutdown() {
        let mut tick = tokio::time::interval(Duration::from_secs(3600));
        let shutdown = Arc::new(AtomicBool::new(false));

        // First tick of an interval is immediate.
        assert!(next_tick(&mut tick, &shutdown).await);

        let flag = Arc::clone(&shutdown);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::Relaxed);
        });

        let stopped = tokio::time::timeout(Duration::from_secs(5), next_tick(&mut tick, &shutdown)).await;
        assert!(matches!(stopped, Ok(false)), "poller wait ignored shutdown");
    }
}
