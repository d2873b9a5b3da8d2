//! Outbound message header: [`Message`] → header block.

use crate::model::address::{format_address_list, EmailAddress};
use crate::model::header_map::HeaderMap;
use crate::model::message::Message;
use crate::parser::date::{format_rfc1123z, is_zero_time, strict_header_date};
use crate::parser::encoded_word::encode_header;

/// Domain of `Message-Id`s synthesized from internal message IDs.
pub const INTERNAL_ID_DOMAIN: &str = "protonmail.internalid";

/// Domain of `References` entries synthesized from conversation IDs.
pub const CONVERSATION_ID_DOMAIN: &str = "protonmail.conversationid";

/// Domain suffixes used to turn provider IDs into RFC 5322 message IDs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdDomains {
    pub internal: String,
    pub conversation: String,
}

impl Default for IdDomains {
    fn default() -> Self {
        Self {
            internal: INTERNAL_ID_DOMAIN.to_string(),
            conversation: CONVERSATION_ID_DOMAIN.to_string(),
        }
    }
}

/// Build the header block for `msg`.
///
/// Starts from a copy of `msg.header` so custom fields survive, then
/// rewrites the standard ones. `msg` is not modified.
pub fn build_header(msg: &Message, domains: &IdDomains) -> HeaderMap {
    let mut header = msg.header.clone().unwrap_or_default();
    write_header_fields(&mut header, msg, domains);
    header
}

/// Write the standard and tracking fields of `msg` into `header`.
pub fn write_header_fields(header: &mut HeaderMap, msg: &Message, domains: &IdDomains) {
    if !msg.subject.is_empty() {
        header.set("Subject", encode_header(&msg.subject));
    }
    if let Some(sender) = &msg.sender {
        header.set("From", encode_header(&sender.to_header_value()));
    }
    set_address_field(header, "Reply-To", &msg.reply_tos);
    set_address_field(header, "To", &msg.to_list);
    set_address_field(header, "Cc", &msg.cc_list);
    set_address_field(header, "Bcc", &msg.bcc_list);

    write_date_fields(header, msg.time);

    // The sender's own Message-Id, when known, takes precedence over a synthesized one.
    if !msg.external_id.is_empty() {
        let external = format!("<{}>", msg.external_id);
        header.set("X-Pm-External-Id", external.clone());
        if !has_value(header, "Message-Id") {
            header.set("Message-Id", external);
        }
    }

    if !msg.id.is_empty() {
        if !has_value(header, "Message-Id") {
            header.set("Message-Id", format!("<{}@{}>", msg.id, domains.internal));
        }
        header.set("X-Pm-Internal-Id", msg.id.clone());
        append_reference(header, &msg.id, &domains.internal);
    }

    if !msg.conversation_id.is_empty() {
        header.set("X-Pm-ConversationID-Id", msg.conversation_id.clone());
        append_reference(header, &msg.conversation_id, &domains.conversation);
    }
}

fn set_address_field(header: &mut HeaderMap, field: &str, addrs: &[EmailAddress]) {
    if !addrs.is_empty() {
        header.set(field, encode_header(&format_address_list(addrs)));
    }
}

/// `X-Pm-Date` always carries `time`; `Date` only replaces a missing,
/// zero or non-RFC 5322 client date.
fn write_date_fields(header: &mut HeaderMap, time: i64) {
    if time <= 0 {
        return;
    }
    let Some(date) = format_rfc1123z(time) else {
        return;
    };

    let client_date_valid = strict_header_date(header).is_some_and(|d| !is_zero_time(&d));
    header.set("X-Pm-Date", date.clone());
    if !client_date_valid {
        header.set("Date", date);
    }
}

fn has_value(header: &HeaderMap, field: &str) -> bool {
    header.get(field).is_some_and(|v| !v.is_empty())
}

/// Append `<id@domain>` to `References` unless `id` already occurs in it.
///
/// The check is a substring match on the first `References` value.
fn append_reference(header: &mut HeaderMap, id: &str, domain: &str) {
    let references = header.get("References").unwrap_or_default();
    if references.contains(id) {
        return;
    }
    let entry = format!("<{id}@{domain}>");
    let updated = if references.trim().is_empty() {
        entry
    } else {
        format!("{references} {entry}")
    };
    header.set("References", updated);
}
