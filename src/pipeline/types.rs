//! Shared types for the message pipeline.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::PipelineError;

/// Sender side of the sourcing channel. Every source holds a clone.
pub type Ingress = mpsc::Sender<RawMessage>;

// ── Inbound ─────────────────────────────────────────────────────────

/// Where a message entered the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    File,
    Web,
    Mail,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Web => "web",
            Self::Mail => "mail",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `POST` to the web channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRequest {
    pub text: String,
}

/// Source-native payload, before normalization.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// A file discovered by the file poller; read during normalization.
    File(PathBuf),
    /// A request received by the web channel.
    Web(WebRequest),
    /// A complete RFC 5322 message.
    Mail(Vec<u8>),
}

impl RawPayload {
    pub fn origin(&self) -> Origin {
        match self {
            Self::File(_) => Origin::File,
            Self::Web(_) => Origin::Web,
            Self::Mail(_) => Origin::Mail,
        }
    }
}

/// A message as delivered by a source.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: Uuid,
    pub payload: RawPayload,
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(payload: RawPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.payload.origin()
    }
}

// ── Normalized ──────────────────────────────────────────────────────

/// A message after normalization. This is what consumers see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub id: Uuid,
    pub origin: Origin,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

// ── Consumers ───────────────────────────────────────────────────────

/// A consumer at the end of the pipeline.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handler name, for logs and the pipeline graph.
    fn name(&self) -> &str;

    async fn handle(&self, message: &TextMessage) -> Result<(), PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_origin_follows_payload() {
        let file = RawMessage::new(RawPayload::File(PathBuf::from("source/a.txt")));
        let web = RawMessage::new(RawPayload::Web(WebRequest { text: "hi".into() }));
        let mail = RawMessage::new(RawPayload::Mail(b"Subject: x\r\n\r\nbody".to_vec()));

        assert_eq!(file.origin(), Origin::File);
        assert_eq!(web.origin(), Origin::Web);
        assert_eq!(mail.origin(), Origin::Mail);
        assert_ne!(file.id, web.id);
    }

    #[test]
    fn origin_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Origin::Mail).unwrap(), "\"mail\"");
        assert_eq!(Origin::Web.to_string(), "web");
    }

    #[test]
    fn web_request_requires_text() {
        let ok: WebRequest = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(ok.text, "hello");
        assert!(serde_json::from_str::<WebRequest>(r#"{"body": "hello"}"#).is_err());
    }
}
