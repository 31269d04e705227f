//! File channel: polls a directory and delivers each new file once.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::channels::next_tick;
use crate::channels::spool::DirectoryScanner;
use crate::config::interval_ms;
use crate::error::ConfigError;
use crate::pipeline::types::{Ingress, RawMessage, RawPayload};

/// File channel configuration.
#[derive(Debug, Clone)]
pub struct FileChannelConfig {
    /// Directory to poll. Created on startup if missing.
    pub dir: PathBuf,
    pub poll_interval: Duration,
}

impl FileChannelConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            dir: lookup("RELAY_SOURCE_DIR")
                .filter(|s| !s.trim().is_empty())
                .map_or_else(|| PathBuf::from("source"), PathBuf::from),
            poll_interval: interval_ms(lookup, "RELAY_FILE_POLL_MS", Duration::from_millis(5000))?,
        })
    }
}

/// Spawn a background task that polls the source directory.
///
/// Every new file found on a tick is delivered, however many there are.
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop polling.
pub fn spawn_file_poller(
    config: FileChannelConfig,
    ingress: Ingress,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        let mut scanner = DirectoryScanner::new(config.dir);
        if let Err(e) = scanner.ensure_dir().await {
            error!(dir = %scanner.dir().display(), "Cannot create source directory: {e}");
        }

        info!(
            dir = %scanner.dir().display(),
            interval_ms = config.poll_interval.as_millis() as u64,
            "File poller started"
        );

        let mut tick = tokio::time::interval(config.poll_interval);

        loop {
            if !next_tick(&mut tick, &shutdown).await {
                info!("File poller shutting down");
                return;
            }

            if !poll_once(&mut scanner, &ingress).await {
                info!("Pipeline closed, file poller stopping");
                return;
            }
        }
    });

    (handle, shutdown_flag)
}

/// Run a single poll cycle. Returns `false` once the pipeline is gone.
async fn poll_once(scanner: &mut DirectoryScanner, ingress: &Ingress) -> bool {
    let paths = match scanner.scan().await {
        Ok(paths) => paths,
        Err(e) => {
            error!(dir = %scanner.dir().display(), "File poll failed: {e}");
            return true;
        }
    };

    for path in paths {
        let message = RawMessage::new(RawPayload::File(path));
        debug!(id = %message.id, "Delivering file");
        if ingress.send(message).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn poll_once_delivers_new_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.txt"), "two").unwrap();
        std::fs::write(dir.path().join("1.txt"), "one").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let mut scanner = DirectoryScanner::new(dir.path());
        assert!(poll_once(&mut scanner, &tx).await);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first.payload, RawPayload::File(ref p) if p.ends_with("1.txt")));
        assert!(matches!(second.payload, RawPayload::File(ref p) if p.ends_with("2.txt")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn poll_once_reports_closed_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "x").unwrap();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut scanner = DirectoryScanner::new(dir.path());
        assert!(!poll_once(&mut scanner, &tx).await);
    }

    #[tokio::test]
    async fn poller_creates_directory_and_picks_up_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("source");
        let (tx, mut rx) = mpsc::channel(8);

        let (handle, shutdown) = spawn_file_poller(
            FileChannelConfig {
                dir: dir.clone(),
                poll_interval: Duration::from_millis(20),
            },
            tx,
        );

        let created = tokio::time::timeout(Duration::from_secs(5), async {
            while !dir.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(created.is_ok(), "source directory was not created");

        std::fs::write(dir.join("hello.txt"), "hello").unwrap();
        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no file delivered")
            .unwrap();
        assert!(matches!(message.payload, RawPayload::File(ref p) if p.ends_with("hello.txt")));

        shutdown.store(true, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_does_not_wait_for_next_interval() {
        let root = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(8);

        let (handle, shutdown) = spawn_file_poller(
            FileChannelConfig {
                dir: root.path().join("source"),
                poll_interval: Duration::from_secs(3600),
            },
            tx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.store(true, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller waited out its interval")
            .unwrap();
    }
}
