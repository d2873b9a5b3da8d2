//! Part headers: message body, `multipart/related` container and attachments.

use sha2::{Digest, Sha512_256};

use crate::model::attachment::Attachment;
use crate::model::header_map::HeaderMap;
use crate::model::message::Message;
use crate::parser::encoded_word::encode_header;

/// Fields copied verbatim from an attachment's original header.
const FORWARDED_FIELDS: [&str; 3] = ["Content-Id", "Content-Description", "Content-Location"];

/// Write the body part's content fields into `header`.
pub fn set_body_content_fields(header: &mut HeaderMap, msg: &Message) {
    header.set("Content-Type", format!("{}; charset=utf-8", msg.mime_type));
    header.set("Content-Disposition", "inline");
    header.set("Content-Transfer-Encoding", "quoted-printable");
}

/// Header of the message body part.
pub fn body_header(msg: &Message) -> HeaderMap {
    let mut header = HeaderMap::new();
    set_body_content_fields(&mut header, msg);
    header
}

/// Header of the `multipart/related` part that groups a body with its
/// inline resources.
pub fn related_header(msg: &Message) -> HeaderMap {
    let mut header = HeaderMap::new();
    header.set(
        "Content-Type",
        format!("multipart/related; boundary={}", related_boundary(msg)),
    );
    header
}

/// Boundary of the top-level `multipart/mixed` part.
///
/// Derived from the message ID so the same message always serializes to the
/// same bytes.
pub fn boundary(msg: &Message) -> String {
    hex_digest(&[msg.id.as_bytes()])
}

/// Boundary of the `multipart/related` part. Distinct from [`boundary`].
pub fn related_boundary(msg: &Message) -> String {
    hex_digest(&[msg.id.as_bytes(), msg.id.as_bytes()])
}

fn hex_digest(chunks: &[&[u8]]) -> String {
    let mut hasher = Sha512_256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    format!("{:x}", hasher.finalize())
}

/// Header of an attachment part.
///
/// `application/pgp-encrypted` is sent as `application/octet-stream` so
/// clients without PGP support can still save the file. Only the fields in
/// [`FORWARDED_FIELDS`] survive from the original attachment header.
pub fn attachment_header(att: &Attachment) -> HeaderMap {
    let media_type = if att.mime_type.eq_ignore_ascii_case("application/pgp-encrypted")
        || att.mime_type.trim().is_empty()
    {
        "application/octet-stream"
    } else {
        att.mime_type.as_str()
    };

    let encoded_name = encode_header(&att.name);
    let disposition = match att.header.get("Content-Disposition") {
        Some(d) if d.contains("inline") => "inline",
        _ => "attachment",
    };

    let mut header = HeaderMap::new();
    header.set(
        "Content-Type",
        format_media_type(media_type, "name", &encoded_name),
    );
    header.set("Content-Transfer-Encoding", "base64");
    header.set(
        "Content-Disposition",
        format_media_type(disposition, "filename", &encoded_name),
    );

    for field in FORWARDED_FIELDS {
        if let Some(value) = att.header.get(field).filter(|v| !v.is_empty()) {
            header.set(field, value);
        }
    }

    header
}

/// `type; key=value`, quoting the value unless it is a bare token.
fn format_media_type(media_type: &str, key: &str, value: &str) -> String {
    let value = if !value.is_empty() && value.chars().all(is_token_char) {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    };
    format!("{}; {key}={value}", media_type.to_ascii_lowercase())
}

/// RFC 2045 token character.
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?=".contains(c)
}
