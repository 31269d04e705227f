//! Message pipeline.
//!
//! Every inbound message, from any channel, flows through:
//! 1. a source channel, which delivers a `RawMessage` into the sourcing channel
//! 2. `normalize()`, which turns the payload into plain text
//! 3. the dispatcher, which hands the `TextMessage` to the primary handler
//!    and a copy to the wire-tap

pub mod graph;
pub mod handlers;
pub mod normalize;
pub mod processor;
pub mod types;

pub use graph::{GraphSources, PipelineGraph};
pub use handlers::{MessageLogger, WireTapLogger};
pub use processor::Pipeline;
pub use types::{Ingress, MessageHandler, Origin, RawMessage, RawPayload, TextMessage, WebRequest};
