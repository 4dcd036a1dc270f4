//! Outbound email through Amazon SES.
//!
//! Customer emails use SES templates so copy can change without a deploy.
//! The staff notification carries a calendar attachment, which templates
//! cannot do, so it goes out as a raw MIME message.

use aws_sdk_ses::primitives::Blob;
use aws_sdk_ses::types::{Destination, RawMessage};
use aws_sdk_ses::Client as SesClient;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

/// A templated email ready to send.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatedEmail {
    pub to: String,
    pub template: String,
    pub data: serde_json::Value,
}

/// A file attached to a raw email.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A plain-text email with one attachment.
#[derive(Debug, Clone)]
pub struct RawEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachment: Attachment,
}

/// Sends templated emails. [`Mailer`] is the SES implementation.
#[allow(async_fn_in_trait)]
pub trait EmailSender {
    /// Send the email, returning the provider's message id.
    async fn send_templated(&self, email: &TemplatedEmail) -> Result<String>;
}

impl EmailSender for Mailer {
    async fn send_templated(&self, email: &TemplatedEmail) -> Result<String> {
        Mailer::send_templated(self, email).await
    }
}

/// SES-backed mailer.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: SesClient,
    /// `From` value, e.g. `winniexnails <hello@winniexnails.com>`
    sender: String,
}

impl Mailer {
    pub fn new(client: SesClient, sender: String) -> Self {
        Self { client, sender }
    }

    /// Send a templated email, returning the SES message id.
    pub async fn send_templated(&self, email: &TemplatedEmail) -> Result<String> {
        let destination = Destination::builder().to_addresses(&email.to).build();

        let result = self
            .client
            .send_templated_email()
            .source(&self.sender)
            .destination(destination)
            .template(&email.template)
            .template_data(serde_json::to_string(&email.data)?)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to send templated email: {}", e)))?;

        let message_id = result.message_id().to_string();
        info!(template = %email.template, message_id = %message_id, "Templated email sent");
        Ok(message_id)
    }

    /// Send a raw MIME email, returning the SES message id.
    pub async fn send_raw(&self, email: &RawEmail) -> Result<String> {
        let boundary = format!("=_{}", Uuid::new_v4().simple());
        let mime = render_mime(&self.sender, email, &boundary);

        let raw_message = RawMessage::builder()
            .data(Blob::new(mime.into_bytes()))
            .build()
            .map_err(|e| Error::Aws(format!("Failed to build raw message: {}", e)))?;

        let result = self
            .client
            .send_raw_email()
            .raw_message(raw_message)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to send raw email: {}", e)))?;

        let message_id = result.message_id().to_string();
        info!(attachment = %email.attachment.filename, message_id = %message_id, "Raw email sent");
        Ok(message_id)
    }
}

/// Render a `multipart/mixed` message: a UTF-8 text part and the attachment.
pub fn render_mime(from: &str, email: &RawEmail, boundary: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("From: {}\r\n", strip_controls(from)));
    out.push_str(&format!("To: {}\r\n", strip_controls(&email.to)));
    out.push_str(&format!("Subject: {}\r\n", encode_header(&email.subject)));
    out.push_str("MIME-Version: 1.0\r\n");
    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));

    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrap_base64(email.text.as_bytes()));

    let attachment = &email.attachment;
    let filename = strip_controls(&attachment.filename).replace('"', "");
    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str(&format!(
        "Content-Type: {}; name=\"{}\"\r\n",
        strip_controls(&attachment.content_type),
        filename
    ));
    out.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{}\"\r\n",
        filename
    ));
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrap_base64(&attachment.content));

    out.push_str(&format!("--{}--\r\n", boundary));
    out
}

/// RFC 2047 encode a header value unless it is printable ASCII. Encoding
/// keeps CR and LF inside the encoded word, so they cannot start a new header.
fn encode_header(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64.encode(value.as_bytes()))
    }
}

/// Drop control characters from an address or parameter header value.
fn strip_controls(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// Base64 with 76-character lines, each terminated by CRLF.
fn wrap_base64(content: &[u8]) -> String {
    let encoded = BASE64.encode(content);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 76 * 2 + 2);
    for chunk in encoded.as_bytes().chunks(76) {
        // base64 output is ASCII
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_email() -> RawEmail {
        RawEmail {
            to: "staff@example.com".to_string(),
            subject: "New booking: Ana".to_string(),
            text: "Service: Gel X".to_string(),
            attachment: Attachment {
                filename: "invite.ics".to_string(),
                content_type: "application/ics".to_string(),
                content: b"BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_vec(),
            },
        }
    }

    #[test]
    fn test_render_mime_structure() {
        let mime = render_mime("salon <hello@example.com>", &raw_email(), "XYZ");

        assert!(mime.starts_with("From: salon <hello@example.com>\r\nTo: staff@example.com\r\n"));
        assert!(mime.contains("Subject: New booking: Ana\r\n"));
        assert!(mime.contains("Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n"));
        assert!(mime.contains("Content-Disposition: attachment; filename=\"invite.ics\"\r\n"));
        assert!(mime.contains(&BASE64.encode("Service: Gel X")));
        assert!(mime.contains(&BASE64.encode("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n")));
        assert_eq!(mime.matches("--XYZ\r\n").count(), 2);
        assert!(mime.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let mut email = raw_email();
        email.subject = "New booking: Zoë".to_string();
        let mime = render_mime("salon <hello@example.com>", &email, "XYZ");
        assert!(mime.contains(&format!(
            "Subject: =?UTF-8?B?{}?=\r\n",
            BASE64.encode("New booking: Zoë")
        )));
    }

    fn header_lines(mime: &str) -> Vec<&str> {
        mime.split("\r\n\r\n")
            .next()
            .unwrap_or_default()
            .split("\r\n")
            .collect()
    }

    #[test]
    fn test_line_breaks_cannot_add_headers() {
        let mut email = raw_email();
        email.subject = "New booking: Ana\r\nBcc: someone@example.net - August 16".to_string();
        email.to = "staff@example.com\r\nCc: someone@example.net".to_string();
        email.attachment.filename = "invite.ics\"\r\nX-Extra: 1".to_string();

        let mime = render_mime("salon <hello@example.com>\n", &email, "XYZ");
        let headers = header_lines(&mime);

        assert_eq!(headers.len(), 5);
        assert!(headers.iter().all(|h| !h.starts_with("Bcc") && !h.starts_with("Cc")));
        assert_eq!(headers[0], "From: salon <hello@example.com>");
        assert_eq!(headers[1], "To: staff@example.comCc: someone@example.net");
        assert_eq!(
            headers[2],
            format!("Subject: =?UTF-8?B?{}?=", BASE64.encode(&email.subject))
        );
        assert!(!mime.contains("\r\nX-Extra"));
        assert!(mime.contains("filename=\"invite.icsX-Extra: 1\"\r\n"));
    }

    #[test]
    fn test_base64_lines_are_wrapped() {
        let wrapped = wrap_base64(&[b'a'; 200]);
        for line in wrapped.trim_end().split("\r\n") {
            assert!(line.len() <= 76);
        }
        let joined: String = wrapped.split("\r\n").collect();
        assert_eq!(BASE64.decode(joined).unwrap(), vec![b'a'; 200]);
    }
}
