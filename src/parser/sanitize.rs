//! Address field sanitizing for inbound mail.
//!
//! Address fields are read through an ordered chain of [`AddressStrategy`]
//! stages. The first stage decodes and strictly parses the value; when that
//! fails (usually because a relay stripped the encoding markers from a
//! non-ASCII display name) the next stage salvages whatever `<mailbox>`
//! spans survived in the raw value.

use tracing::{debug, trace};

use crate::error::{HeaderError, Result};
use crate::model::address::EmailAddress;
use crate::model::header_map::HeaderMap;
use crate::parser::encoded_word::{HeaderDecoder, Rfc2047Decoder};

/// One address field as seen by the strategies.
pub struct FieldValue<'a> {
    /// Field name, for diagnostics.
    pub field: &'a str,
    /// The value exactly as it appears in the header block.
    pub raw: &'a str,
    /// The value after RFC 2047 decoding, or why decoding failed.
    pub decoded: Result<String>,
}

/// A single attempt at turning a field value into addresses.
pub trait AddressStrategy {
    fn name(&self) -> &'static str;
    fn attempt(&self, value: &FieldValue<'_>) -> Result<Vec<EmailAddress>>;
}

/// Strict parsing of the decoded value, with comments removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictParse;

impl AddressStrategy for StrictParse {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn attempt(&self, value: &FieldValue<'_>) -> Result<Vec<EmailAddress>> {
        match &value.decoded {
            Ok(decoded) => EmailAddress::parse_list(&strip_comments(decoded)),
            Err(HeaderError::DecodeFailure(reason)) => {
                Err(HeaderError::DecodeFailure(reason.clone()))
            }
            Err(other) => Err(HeaderError::DecodeFailure(other.to_string())),
        }
    }
}

/// Keep only the bracketed `<...>` spans of the raw value and parse those.
///
/// Display names and any other text outside brackets are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketRecovery;

impl AddressStrategy for BracketRecovery {
    fn name(&self) -> &'static str {
        "bracket-recovery"
    }

    fn attempt(&self, value: &FieldValue<'_>) -> Result<Vec<EmailAddress>> {
        let spans = bracketed_spans(value.raw);
        if spans.is_empty() {
            return Err(HeaderError::AddressParseFailure(format!(
                "no bracketed address in {}",
                value.field
            )));
        }
        EmailAddress::parse_list(&spans.join(", "))
    }
}

/// The default chain: strict parsing, then bracket recovery.
pub const DEFAULT_STRATEGIES: &[&dyn AddressStrategy] = &[&StrictParse, &BracketRecovery];

/// Run `strategies` in order and return the first success.
///
/// If every stage fails, the last stage's error is returned.
pub fn run_strategies(
    strategies: &[&dyn AddressStrategy],
    value: &FieldValue<'_>,
) -> Result<Vec<EmailAddress>> {
    let mut last_error = None;

    for (idx, strategy) in strategies.iter().enumerate() {
        match strategy.attempt(value) {
            Ok(addrs) => {
                if idx > 0 {
                    debug!(
                        field = value.field,
                        strategy = strategy.name(),
                        count = addrs.len(),
                        "Recovered addresses from malformed field"
                    );
                }
                return Ok(addrs);
            }
            Err(e) => {
                debug!(
                    field = value.field,
                    strategy = strategy.name(),
                    error = %e,
                    "Address strategy failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        HeaderError::AddressParseFailure("no address strategy configured".into())
    }))
}

/// Read and parse the address list in `field`, decoding with RFC 2047.
///
/// Fails with [`HeaderError::FieldNotPresent`] when the field is absent or
/// empty. A field that is present but holds no mailboxes (an empty group)
/// yields an empty vector.
pub fn sanitize_address_list(header: &HeaderMap, field: &str) -> Result<Vec<EmailAddress>> {
    sanitize_address_list_with(&Rfc2047Decoder, header, field)
}

/// [`sanitize_address_list`] with a caller-supplied decoder.
pub fn sanitize_address_list_with(
    decoder: &impl HeaderDecoder,
    header: &HeaderMap,
    field: &str,
) -> Result<Vec<EmailAddress>> {
    let raw = match header.get(field) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            trace!(field, "Address field not present");
            return Err(HeaderError::FieldNotPresent(field.to_string()));
        }
    };

    let value = FieldValue {
        field,
        raw,
        decoded: decoder.decode(raw),
    };
    run_strategies(DEFAULT_STRATEGIES, &value)
}

/// Collect every `<...>` span of `raw` in order, brackets included.
///
/// Each scan runs from an opening bracket to the next closing bracket and
/// resumes after it. An opening bracket with no closing one ends the scan.
pub fn bracketed_spans(raw: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        let from_open = &rest[open..];
        match from_open.find('>') {
            Some(close) => {
                spans.push(&from_open[..=close]);
                rest = &from_open[close + 1..];
            }
            None => break,
        }
    }
    spans
}

/// Remove parenthesized comments outside quoted strings.
///
/// Comments nest and honor backslash escapes. Each comment is replaced by a
/// space. An unterminated comment is left in place.
pub fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut comment = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if depth > 0 {
            comment.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        comment.push(next);
                    }
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        comment.clear();
                        out.push(' ');
                    }
                }
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = !in_quotes;
                out.push(c);
            }
            '\\' if in_quotes => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '(' if !in_quotes => {
                depth = 1;
                comment.push(c);
            }
            _ => out.push(c),
        }
    }

    out.push_str(&comment);
    out
}
