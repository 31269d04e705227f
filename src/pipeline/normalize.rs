//! Normalizers: turn each source's native payload into plain text.

use std::path::Path;

use mail_parser::MessageParser;

use crate::error::NormalizeError;
use crate::mime;
use crate::pipeline::types::{RawPayload, WebRequest};

/// Normalize any raw payload.
pub async fn normalize(payload: RawPayload) -> Result<String, NormalizeError> {
    match payload {
        RawPayload::File(path) => file_to_text(&path).await,
        RawPayload::Web(request) => Ok(web_to_text(request)),
        RawPayload::Mail(raw) => mail_to_text(&raw),
    }
}

/// Read a file's contents as UTF-8 text.
pub async fn file_to_text(path: &Path) -> Result<String, NormalizeError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub fn web_to_text(request: WebRequest) -> String {
    request.text
}

/// Parse a raw mail and flatten its body to text.
pub fn mail_to_text(raw: &[u8]) -> Result<String, NormalizeError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or(NormalizeError::MalformedMail)?;
    let root = mime::from_message(&message)?;
    Ok(mime::extract_text(&root)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_to_text_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "from disk\nsecond line").unwrap();

        let text = normalize(RawPayload::File(path)).await.unwrap();
        assert_eq!(text, "from disk\nsecond line");
    }

    #[tokio::test]
    async fn file_to_text_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_to_text(&dir.path().join("gone.txt")).await.unwrap_err();
        assert!(matches!(err, NormalizeError::Io { .. }));
    }

    #[tokio::test]
    async fn file_to_text_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(file_to_text(&path).await.is_err());
    }

    #[tokio::test]
    async fn web_payload_passes_text_through() {
        let text = normalize(RawPayload::Web(WebRequest {
            text: "posted".into(),
        }))
        .await
        .unwrap();
        assert_eq!(text, "posted");
    }

    #[test]
    fn mail_to_text_multipart() {
        let raw = b"From: a@example.com\r\n\
            Subject: Hi\r\n\
            Content-Type: multipart/mixed; boundary=\"b\"\r\n\
            \r\n\
            --b\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>Hello <b>there</b></p>\r\n\
            --b\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            General Kenobi\r\n\
            --b--\r\n";
        let text = mail_to_text(raw).unwrap();
        assert!(text.starts_with("\nHello there\nGeneral Kenobi"));
    }

    #[test]
    fn mail_to_text_html_only_message() {
        let raw = b"From: a@example.com\r\n\
            Subject: Newsletter\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <html><body><h1>News</h1><script>track()</script><p>Read more</p></body></html>";
        assert_eq!(mail_to_text(raw).unwrap(), "\nNews Read more");
    }
}
