//! Text relay: multi-source message ingestion with MIME text extraction.

pub mod channels;
pub mod config;
pub mod error;
pub mod mime;
pub mod pipeline;
