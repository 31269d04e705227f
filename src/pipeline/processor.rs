//! Pipeline stages and the channels between them.
//!
//! ```text
//! sources ─▶ sourcing (mpsc) ─▶ normalizer ─▶ process (mpsc) ─▶ dispatcher ─▶ primary handler
//!                                                                   │
//!                                                                   └─▶ wire-tap (broadcast) ─▶ tap handler
//! ```
//!
//! The dispatcher copies each message onto the wire-tap before handing it to
//! the primary handler. The copy never waits: a slow tap loses its oldest
//! messages instead of holding up the primary path.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::pipeline::normalize::normalize;
use crate::pipeline::types::{Ingress, MessageHandler, RawMessage, TextMessage};

/// Running pipeline stages.
pub struct Pipeline {
    stages: Vec<(&'static str, JoinHandle<()>)>,
}

impl Pipeline {
    /// Spawn all stages. Returns the ingress sender sources deliver into.
    ///
    /// The pipeline drains and stops once every clone of the returned
    /// [`Ingress`] has been dropped.
    pub fn spawn(
        config: &PipelineConfig,
        primary: Arc<dyn MessageHandler>,
        tap: Arc<dyn MessageHandler>,
    ) -> (Ingress, Self) {
        let (raw_tx, raw_rx) = mpsc::channel(config.channel_capacity);
        let (text_tx, text_rx) = mpsc::channel(config.channel_capacity);
        let (tap_tx, tap_rx) = broadcast::channel(config.wiretap_capacity);

        info!(
            primary = primary.name(),
            tap = tap.name(),
            capacity = config.channel_capacity,
            "Pipeline started"
        );

        let stages = vec![
            ("normalizer", tokio::spawn(run_normalizer(raw_rx, text_tx))),
            (
                "dispatcher",
                tokio::spawn(run_dispatcher(text_rx, primary, tap_tx)),
            ),
            ("wiretap", tokio::spawn(run_wiretap(tap_rx, tap))),
        ];

        (raw_tx, Self { stages })
    }

    /// Wait for every stage to finish draining.
    pub async fn join(self) {
        for (stage, handle) in self.stages {
            if let Err(e) = handle.await {
                error!(stage, "Pipeline stage panicked: {e}");
            }
        }
        info!("Pipeline drained");
    }
}

async fn run_normalizer(mut rx: mpsc::Receiver<RawMessage>, tx: mpsc::Sender<TextMessage>) {
    while let Some(raw) = rx.recv().await {
        let (id, origin, received_at) = (raw.id, raw.origin(), raw.received_at);

        let text = match normalize(raw.payload).await {
            Ok(text) => text,
            Err(e) => {
                error!(id = %id, origin = %origin, error = %e, "Failed to normalize message");
                continue;
            }
        };

        debug!(id = %id, origin = %origin, len = text.len(), "Message normalized");

        let message = TextMessage {
            id,
            origin,
            text,
            received_at,
        };
        if tx.send(message).await.is_err() {
            warn!("Process channel closed, normalizer stopping");
            return;
        }
    }
    debug!("Sourcing channel closed, normalizer stopping");
}

async fn run_dispatcher(
    mut rx: mpsc::Receiver<TextMessage>,
    primary: Arc<dyn MessageHandler>,
    tap: broadcast::Sender<TextMessage>,
) {
    while let Some(message) = rx.recv().await {
        // Fails only when nobody is tapping.
        if tap.send(message.clone()).is_err() {
            debug!(id = %message.id, "No wire-tap subscriber");
        }

        if let Err(e) = primary.handle(&message).await {
            error!(
                id = %message.id,
                handler = primary.name(),
                error = %e,
                "Primary handler failed"
            );
        }
    }
    debug!("Process channel closed, dispatcher stopping");
}

async fn run_wiretap(mut rx: broadcast::Receiver<TextMessage>, tap: Arc<dyn MessageHandler>) {
    loop {
        match rx.recv().await {
            Ok(message) => {
                if let Err(e) = tap.handle(&message).await {
                    warn!(
                        id = %message.id,
                        handler = tap.name(),
                        error = %e,
                        "Wire-tap handler failed"
                    );
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Wire-tap lagging, oldest messages dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Wire-tap closed");
}
