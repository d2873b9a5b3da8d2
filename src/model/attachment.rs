//! Attachment metadata.

use super::header_map::HeaderMap;

/// Metadata about an attachment of a [`Message`](super::message::Message).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Attachment {
    /// Filename of the attachment.
    pub name: String,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub mime_type: String,

    /// The attachment's original part header. `Content-Disposition` decides
    /// inline vs. attachment, and `Content-Id`, `Content-Description` and
    /// `Content-Location` are forwarded from it.
    pub header: HeaderMap,
}
