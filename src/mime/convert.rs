//! Build a [`MailPart`] tree from a message parsed by `mail-parser`.

use mail_parser::{Message, MessagePart, MimeHeaders, PartType};

use super::part::{MailPart, Payload};
use crate::error::ContentReadError;

enum Visit {
    Enter(usize),
    Exit { id: usize, children: Vec<usize> },
}

/// Convert a parsed message into a body tree.
///
/// `mail-parser` stores parts flat and links multiparts to their children by
/// index; the tree is rebuilt without recursion. Bodies that failed transfer
/// decoding become [`Payload::Unreadable`] so the failure surfaces only if the
/// extractor actually reads them.
pub fn from_message(message: &Message<'_>) -> Result<MailPart, ContentReadError> {
    let parts = &message.parts;
    if parts.is_empty() {
        return Err(ContentReadError::Malformed("message has no parts".into()));
    }

    let mut built: Vec<Option<MailPart>> = vec![None; parts.len()];
    let mut claimed = vec![false; parts.len()];
    claimed[0] = true;
    let mut stack = vec![Visit::Enter(0)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                let part = &parts[id];
                let PartType::Multipart(child_ids) = &part.body else {
                    built[id] = Some(leaf_from(part));
                    continue;
                };

                let mut children = Vec::with_capacity(child_ids.len());
                for child in child_ids {
                    let index = usize::try_from(*child)
                        .ok()
                        .filter(|index| *index < parts.len())
                        .ok_or_else(|| {
                            ContentReadError::Malformed(format!(
                                "part {id} references missing part {child}"
                            ))
                        })?;
                    if std::mem::replace(&mut claimed[index], true) {
                        return Err(ContentReadError::Malformed(format!(
                            "part {index} is referenced more than once"
                        )));
                    }
                    children.push(index);
                }

                let enter: Vec<Visit> = children.iter().rev().map(|c| Visit::Enter(*c)).collect();
                stack.push(Visit::Exit { id, children });
                stack.extend(enter);
            }
            Visit::Exit { id, children } => {
                let children = children
                    .into_iter()
                    .map(|index| {
                        built[index].take().ok_or_else(|| {
                            ContentReadError::Malformed(format!("part {index} was never built"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                built[id] = Some(MailPart::container(content_type_of(&parts[id]), children));
            }
        }
    }

    built[0]
        .take()
        .ok_or_else(|| ContentReadError::Malformed("root part was never built".into()))
}

fn leaf_from(part: &MessagePart<'_>) -> MailPart {
    let content_type = content_type_of(part);
    let payload = if part.is_encoding_problem {
        Payload::Unreadable("content transfer decoding failed".into())
    } else {
        match &part.body {
            PartType::Text(text) | PartType::Html(text) => Payload::Text(text.to_string()),
            PartType::Binary(bytes) | PartType::InlineBinary(bytes) => Payload::Bytes(bytes.to_vec()),
            PartType::Message(nested) => Payload::Bytes(nested.raw_message.to_vec()),
            PartType::Multipart(_) => Payload::Unreadable("multipart body without children".into()),
        }
    };
    MailPart::leaf(content_type, payload)
}

/// Declared `type/subtype`, or the type implied by the decoded body when the
/// header is absent.
fn content_type_of(part: &MessagePart<'_>) -> String {
    if let Some(ct) = MimeHeaders::content_type(part) {
        return match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        };
    }
    match &part.body {
        PartType::Text(_) => "text/plain",
        PartType::Html(_) => "text/html",
        PartType::Binary(_) | PartType::InlineBinary(_) => "application/octet-stream",
        PartType::Message(_) => "message/rfc822",
        PartType::Multipart(_) => "multipart/mixed",
    }
    .to_string()
}
