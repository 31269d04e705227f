//! Logging consumers at the end of the pipeline.

use async_trait::async_trait;
use tracing::info;

use crate::error::PipelineError;
use crate::pipeline::types::{MessageHandler, TextMessage};

/// Primary consumer: logs every processed message.
#[derive(Debug, Default)]
pub struct MessageLogger;

#[async_trait]
impl MessageHandler for MessageLogger {
    fn name(&self) -> &str {
        "message-logger"
    }

    async fn handle(&self, message: &TextMessage) -> Result<(), PipelineError> {
        info!(
            id = %message.id,
            origin = %message.origin,
            "Received message: {}",
            message.text
        );
        Ok(())
    }
}

/// Wire-tap consumer: logs the tapped copy of each message.
#[derive(Debug, Default)]
pub struct WireTapLogger;

#[async_trait]
impl MessageHandler for WireTapLogger {
    fn name(&self) -> &str {
        "wiretap-logger"
    }

    async fn handle(&self, message: &TextMessage) -> Result<(), PipelineError> {
        info!(
            id = %message.id,
            origin = %message.origin,
            "[WireTap] Received message: {}",
            message.text
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::pipeline::types::Origin;

    fn message(text: &str) -> TextMessage {
        TextMessage {
            id: Uuid::new_v4(),
            origin: Origin::File,
            text: text.to_string(),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn loggers_accept_every_message() {
        let handlers: [&dyn MessageHandler; 2] = [&MessageLogger, &WireTapLogger];
        for handler in handlers {
            handler.handle(&message("logged")).await.unwrap();
            handler.handle(&message("")).await.unwrap();
        }
    }

    #[test]
    fn logger_names_match_graph_nodes() {
        assert_eq!(MessageLogger.name(), "message-logger");
        assert_eq!(WireTapLogger.name(), "wiretap-logger");
    }
}
