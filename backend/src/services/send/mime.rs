//! Assembly of the RFC 822 message handed to Gmail.
//!
//! ```text
//! multipart/mixed
//!   text/plain; charset=UTF-8     body
//!   <guessed>; name=...           certificate, base64
//! ```
//!
//! Gmail expects the whole message base64url-encoded in the `raw` field.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

const LINE_WIDTH: usize = 76;

pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Drops CR and LF so values cannot inject headers.
fn header_value(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// RFC 2047 encoded-word when the subject is not plain ASCII.
fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH * 2 + 2);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII, so every chunk is valid UTF-8.
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

pub fn build_message(to: &str, subject: &str, body: &str, attachment: &Attachment) -> String {
    let boundary = format!("certimate_{}", uuid::Uuid::new_v4().simple());
    let filename = header_value(&attachment.filename).replace('"', "");
    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    let mut message = String::new();
    message.push_str(&format!("To: {}\r\n", header_value(to)));
    message.push_str(&format!("Subject: {}\r\n", encode_subject(subject)));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));

    message.push_str(&format!("--{}\r\n", boundary));
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n");
    message.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    message.push_str(&wrap_base64(body.as_bytes()));

    message.push_str(&format!("--{}\r\n", boundary));
    message.push_str(&format!(
        "Content-Type: {}; name=\"{}\"\r\n",
        content_type, filename
    ));
    message.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{}\"\r\n",
        filename
    ));
    message.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    message.push_str(&wrap_base64(&attachment.bytes));
    message.push_str(&format!("--{}--\r\n", boundary));
    message
}

/// The `raw` field of a Gmail send request.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE.encode(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment() -> Attachment {
        Attachment {
            filename: "certificate_0001_Ada.pdf".to_string(),
            bytes: vec![7u8; 200],
        }
    }

    #[test]
    fn test_message_layout() {
        let msg = build_message("ada@example.org", "Your certificate", "Hi Ada", &attachment());
        assert!(msg.starts_with("To: ada@example.org\r\nSubject: Your certificate\r\n"));
        assert!(msg.contains("Content-Type: application/pdf; name=\"certificate_0001_Ada.pdf\""));
        assert!(msg.contains("Content-Disposition: attachment"));
        assert!(msg.contains(&STANDARD.encode("Hi Ada")));
        assert!(msg.trim_end().ends_with("--"));
        assert!(msg.lines().all(|l| l.len() <= 998));
    }

    #[test]
    fn test_attachment_lines_wrapped_at_76() {
        let wrapped = wrap_base64(&[1u8; 300]);
        let lines: Vec<&str> = wrapped.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= LINE_WIDTH));
        assert_eq!(STANDARD.decode(lines.concat()).unwrap(), vec![1u8; 300]);
    }

    #[test]
    fn test_non_ascii_subject_is_encoded_word() {
        assert_eq!(encode_subject("Merci"), "Merci");
        let encoded = encode_subject("Félicitations");
        assert!(encoded.starts_with("=?UTF-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_headers_cannot_be_injected() {
        let msg = build_message("a@b.org\r\nBcc: x@y.org", "s", "b", &attachment());
        assert!(!msg.contains("\r\nBcc:"));
    }

    #[test]
    fn test_raw_is_url_safe() {
        let raw = encode_raw("subject?>>>");
        assert!(!raw.contains('+') && !raw.contains('/'));
        assert_eq!(URL_SAFE.decode(raw).unwrap(), b"subject?>>>");
    }
}
