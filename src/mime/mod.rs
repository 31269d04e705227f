//! Mail content extraction.
//!
//! A fetched message is turned into a [`MailPart`] tree ([`from_message`]),
//! which [`extract_text`] flattens into plain text. HTML parts are reduced to
//! their visible text with [`strip_html`].

pub mod convert;
pub mod extract;
pub mod html;
pub mod part;

pub use convert::from_message;
pub use extract::extract_text;
pub use html::strip_html;
pub use part::{MailPart, Payload, mime_essence};
