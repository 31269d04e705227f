//! Mail body tree: the shape a fetched message is handed to the extractor in.

use std::borrow::Cow;

use crate::error::ContentReadError;

/// Materialized content of a leaf part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Already-decoded text.
    Text(String),
    /// Raw bytes; read as UTF-8 when the part is a text type.
    Bytes(Vec<u8>),
    /// The producer could not materialize the content. Holds the reason.
    Unreadable(String),
}

/// A node in an email body tree.
///
/// Either a leaf carrying a payload or a container of ordered children,
/// never both. Child order is MIME part order and is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailPart {
    Leaf {
        content_type: String,
        payload: Payload,
    },
    Container {
        content_type: String,
        children: Vec<MailPart>,
    },
}

impl MailPart {
    /// A leaf with an arbitrary content type.
    pub fn leaf(content_type: impl Into<String>, payload: Payload) -> Self {
        Self::Leaf {
            content_type: content_type.into(),
            payload,
        }
    }

    /// A `text/plain` leaf.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::leaf("text/plain", Payload::Text(text.into()))
    }

    /// A `text/html` leaf.
    pub fn html(html: impl Into<String>) -> Self {
        Self::leaf("text/html", Payload::Text(html.into()))
    }

    /// A container with an explicit content type.
    pub fn container(content_type: impl Into<String>, children: Vec<MailPart>) -> Self {
        Self::Container {
            content_type: content_type.into(),
            children,
        }
    }

    /// A `multipart/mixed` container.
    pub fn multipart(children: Vec<MailPart>) -> Self {
        Self::container("multipart/mixed", children)
    }

    /// Declared content type, as given by the producer (may carry parameters).
    pub fn content_type(&self) -> &str {
        match self {
            Self::Leaf { content_type, .. } | Self::Container { content_type, .. } => content_type,
        }
    }

    /// Whether the declared type matches `essence` (`type/subtype`),
    /// ignoring case and parameters.
    pub fn is_mime_type(&self, essence: &str) -> bool {
        mime_essence(self.content_type()).eq_ignore_ascii_case(essence)
    }
}

// Trees can be arbitrarily deep; release them without recursing.
impl Drop for MailPart {
    fn drop(&mut self) {
        let Self::Container { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut part) = pending.pop() {
            if let Self::Container { children, .. } = &mut part {
                pending.append(children);
            }
        }
    }
}

impl Payload {
    /// Read the payload as text on behalf of a part declaring `content_type`.
    pub fn read_text(&self, content_type: &str) -> Result<Cow<'_, str>, ContentReadError> {
        match self {
            Self::Text(text) => Ok(Cow::Borrowed(text)),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|source| {
                ContentReadError::InvalidUtf8 {
                    content_type: content_type.to_string(),
                    source,
                }
            }),
            Self::Unreadable(reason) => Err(ContentReadError::Unavailable {
                content_type: content_type.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// `type/subtype` portion of a content type, without parameters or padding.
pub fn mime_essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(mime_essence("text/plain; charset=utf-8"), "text/plain");
        assert_eq!(mime_essence("  text/html  "), "text/html");
        assert_eq!(mime_essence(""), "");
    }

    #[test]
    fn mime_type_match_ignores_case_and_params() {
        let part = MailPart::leaf("Text/Plain; charset=\"ISO-8859-1\"", Payload::Text("x".into()));
        assert!(part.is_mime_type("text/plain"));
        assert!(!part.is_mime_type("text/html"));
    }

    #[test]
    fn read_text_decodes_utf8_bytes() {
        let payload = Payload::Bytes("héllo".as_bytes().to_vec());
        assert_eq!(payload.read_text("text/plain").unwrap(), "héllo");
    }

    #[test]
    fn read_text_rejects_invalid_utf8() {
        let payload = Payload::Bytes(vec![0xff, 0xfe, 0x41]);
        let err = payload.read_text("text/plain").unwrap_err();
        assert!(matches!(err, ContentReadError::InvalidUtf8 { .. }));
    }

    #[test]
    fn read_text_unreadable_reports_type_and_reason() {
        let payload = Payload::Unreadable("truncated".into());
        match payload.read_text("text/html").unwrap_err() {
            ContentReadError::Unavailable {
                content_type,
                reason,
            } => {
                assert_eq!(content_type, "text/html");
                assert_eq!(reason, "truncated");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn deep_tree_drops_without_overflow() {
        let mut part = MailPart::plain("bottom");
        for _ in 0..200_000 {
            part = MailPart::multipart(vec![part]);
        }
        drop(part);
    }
}
