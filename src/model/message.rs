//! Message metadata exchanged with the composer and importer.

use super::address::EmailAddress;
use super::header_map::HeaderMap;

/// Structured metadata of a single message.
///
/// Empty strings stand for "not set" on the identifier fields.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Message {
    /// Internal, provider-assigned ID.
    pub id: String,

    /// Provider-assigned import ID.
    pub external_id: String,

    /// Groups related messages.
    pub conversation_id: String,

    /// Decoded subject line.
    pub subject: String,

    pub sender: Option<EmailAddress>,

    pub reply_tos: Vec<EmailAddress>,

    pub to_list: Vec<EmailAddress>,

    pub cc_list: Vec<EmailAddress>,

    pub bcc_list: Vec<EmailAddress>,

    /// Media type of the body (e.g. `"text/html"`).
    pub mime_type: String,

    /// Unix timestamp; 0 means unset.
    pub time: i64,

    /// The underlying header block. Always `Some` after parsing.
    pub header: Option<HeaderMap>,
}

impl Message {
    /// An empty message with `time = 0` and no header block.
    pub fn new() -> Self {
        Self::default()
    }
}
