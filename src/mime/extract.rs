//! Flatten a mail body tree into plain text.

use tracing::trace;

use super::html::strip_html;
use super::part::{MailPart, mime_essence};
use crate::error::ContentReadError;

/// How a leaf contributes to the extracted text.
enum LeafKind {
    Plain,
    Html,
    Other,
}

fn classify_leaf(content_type: &str) -> Result<LeafKind, ContentReadError> {
    let essence = mime_essence(content_type);
    if essence.eq_ignore_ascii_case("text/plain") {
        Ok(LeafKind::Plain)
    } else if essence.eq_ignore_ascii_case("text/html") {
        Ok(LeafKind::Html)
    } else if is_multipart(essence) {
        Err(ContentReadError::ShapeMismatch {
            content_type: content_type.to_string(),
            shape: "leaf",
        })
    } else {
        Ok(LeafKind::Other)
    }
}

fn is_multipart(essence: &str) -> bool {
    essence
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
}

/// A container must not claim to be a text leaf.
fn check_container(content_type: &str) -> Result<(), ContentReadError> {
    let essence = mime_essence(content_type);
    if essence.eq_ignore_ascii_case("text/plain") || essence.eq_ignore_ascii_case("text/html") {
        return Err(ContentReadError::ShapeMismatch {
            content_type: content_type.to_string(),
            shape: "multipart",
        });
    }
    Ok(())
}

/// Extract the text of a mail body tree.
///
/// Children of each container are visited in order:
/// - a `text/plain` leaf appends `"\n" + text`, then the rest of that
///   container's children are skipped;
/// - a `text/html` leaf appends `"\n" + visible text` and visiting continues;
/// - a nested container is walked in place, with its own short-circuit;
/// - anything else contributes nothing.
///
/// A leaf root is treated as the only child of an implicit container. Any
/// unreadable part fails the whole extraction.
pub fn extract_text(root: &MailPart) -> Result<String, ContentReadError> {
    let top: &[MailPart] = match root {
        MailPart::Container {
            content_type,
            children,
        } => {
            check_container(content_type)?;
            children
        }
        MailPart::Leaf { .. } => std::slice::from_ref(root),
    };

    let mut text = String::new();
    // One iterator per open container; the innermost is on top.
    let mut open = vec![top.iter()];

    while let Some(siblings) = open.last_mut() {
        let Some(part) = siblings.next() else {
            open.pop();
            continue;
        };

        match part {
            MailPart::Container {
                content_type,
                children,
            } => {
                check_container(content_type)?;
                open.push(children.iter());
            }
            MailPart::Leaf {
                content_type,
                payload,
            } => match classify_leaf(content_type)? {
                LeafKind::Plain => {
                    text.push('\n');
                    text.push_str(&payload.read_text(content_type)?);
                    open.pop();
                }
                LeafKind::Html => {
                    let html = payload.read_text(content_type)?;
                    text.push('\n');
                    text.push_str(&strip_html(&html));
                }
                LeafKind::Other => {
                    trace!(content_type = %content_type, "Skipping part");
                }
            },
        }
    }

    Ok(text)
}
