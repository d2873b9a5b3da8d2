//! Inbound header parsing: header block → [`Message`].

use tracing::{debug, trace};

use crate::model::address::EmailAddress;
use crate::model::header_map::HeaderMap;
use crate::model::message::Message;
use crate::parser::date::{header_date, is_zero_time};
use crate::parser::encoded_word::{HeaderDecoder, Rfc2047Decoder};
use crate::parser::sanitize::sanitize_address_list_with;

/// Build a [`Message`] from a header block.
///
/// Never fails: a field that cannot be decoded or parsed is left at its
/// default and the rest of the message is still filled in. The header block
/// itself is kept in [`Message::header`].
pub fn parse_header(header: HeaderMap) -> Message {
    parse_header_with(&Rfc2047Decoder, header)
}

/// [`parse_header`] with a caller-supplied decoder.
pub fn parse_header_with(decoder: &impl HeaderDecoder, header: HeaderMap) -> Message {
    let mut msg = Message::new();

    match decoder.decode(header.get("Subject").unwrap_or_default()) {
        Ok(subject) => msg.subject = subject,
        Err(e) => debug!(error = %e, "Could not decode Subject, leaving it empty"),
    }

    if let Some(first) = address_field(decoder, &header, "From").and_then(|a| a.into_iter().next())
    {
        msg.sender = Some(first);
    }
    if let Some(reply_tos) = address_field(decoder, &header, "Reply-To") {
        msg.reply_tos = reply_tos;
    }
    msg.to_list = address_field(decoder, &header, "To").unwrap_or_default();
    msg.cc_list = address_field(decoder, &header, "Cc").unwrap_or_default();
    msg.bcc_list = address_field(decoder, &header, "Bcc").unwrap_or_default();

    msg.time = header_date(&header)
        .filter(|d| !is_zero_time(d))
        .map(|d| d.timestamp())
        .unwrap_or(0);

    msg.header = Some(header);
    msg
}

/// Sanitize one address field, absorbing the error.
fn address_field(
    decoder: &impl HeaderDecoder,
    header: &HeaderMap,
    field: &str,
) -> Option<Vec<EmailAddress>> {
    match sanitize_address_list_with(decoder, header, field) {
        Ok(addrs) => Some(addrs),
        Err(e) if e.is_not_present() => {
            trace!(field, "Address field absent");
            None
        }
        Err(e) => {
            debug!(field, error = %e, "Dropping unparsable address field");
            None
        }
    }
}
