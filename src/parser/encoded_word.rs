//! RFC 2047 encoded-words: encoding outbound header values and decoding inbound ones.

use base64::Engine;
use tracing::warn;

use crate::error::{HeaderError, Result};

/// Longest encoded-word allowed by RFC 2047 §2.
const MAX_WORD_LEN: usize = 75;
const WORD_PREFIX: &str = "=?utf-8?q?";
const WORD_SUFFIX: &str = "?=";

/// Decodes header values. Implemented by [`Rfc2047Decoder`] and by any
/// `Fn(&str) -> Result<String>`, which lets callers substitute their own.
pub trait HeaderDecoder {
    fn decode(&self, value: &str) -> Result<String>;
}

/// The standard RFC 2047 decoder ([`decode_header`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc2047Decoder;

impl HeaderDecoder for Rfc2047Decoder {
    fn decode(&self, value: &str) -> Result<String> {
        decode_header(value)
    }
}

impl<F> HeaderDecoder for F
where
    F: Fn(&str) -> Result<String>,
{
    fn decode(&self, value: &str) -> Result<String> {
        self(value)
    }
}

/// Encode a header value as UTF-8 Q encoded-words if it needs it.
///
/// Printable ASCII (and TAB) passes through untouched. Anything else is
/// encoded as a whole, split into words of at most 75 characters on
/// character boundaries.
///
/// Example: `"Café"` → `"=?utf-8?q?Caf=C3=A9?="`
pub fn encode_header(text: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut current = String::from(WORD_PREFIX);

    for ch in text.chars() {
        let encoded = q_encode_char(ch);
        if current.len() + encoded.len() + WORD_SUFFIX.len() > MAX_WORD_LEN
            && current.len() > WORD_PREFIX.len()
        {
            current.push_str(WORD_SUFFIX);
            words.push(std::mem::replace(&mut current, String::from(WORD_PREFIX)));
        }
        current.push_str(&encoded);
    }
    current.push_str(WORD_SUFFIX);
    words.push(current);

    words.join(" ")
}

fn needs_encoding(text: &str) -> bool {
    text.bytes().any(|b| (b < b' ' || b > b'~') && b != b'\t')
}

/// Q-encode one character using the restricted set that is safe inside a
/// phrase (RFC 2047 §5 rule 3).
fn q_encode_char(ch: char) -> String {
    if ch == ' ' {
        return "_".to_string();
    }
    if ch.is_ascii_alphanumeric() || matches!(ch, '!' | '*' | '+' | '-' | '/') {
        return ch.to_string();
    }
    let mut buf = [0u8; 4];
    ch.encode_utf8(&mut buf)
        .bytes()
        .map(|b| format!("={b:02X}"))
        .collect()
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Words that are malformed, or whose payload is not valid B/Q data, are
/// kept as literal text. A word in a charset we cannot convert fails the
/// whole value with [`HeaderError::DecodeFailure`].
pub fn decode_header(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // If the gap between two encoded words is only whitespace, skip it (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];

        match try_decode_one_word(after_start)? {
            Some(decoded) => {
                result.push_str(&decoded.text);
                remaining = &after_start[decoded.consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    Ok(result)
}

struct DecodedWord {
    text: String,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

fn try_decode_one_word(s: &str) -> Result<Option<DecodedWord>> {
    // Format: charset?encoding?encoded_text?=
    let Some(first_q) = s.find('?') else {
        return Ok(None);
    };
    let charset = &s[..first_q];
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return Ok(None);
    }

    let rest = &s[first_q + 1..];
    let Some(second_q) = rest.find('?') else {
        return Ok(None);
    };
    let encoding = &rest[..second_q];
    if encoding.len() != 1 {
        return Ok(None);
    }

    let rest2 = &rest[second_q + 1..];
    let Some(end) = rest2.find("?=") else {
        return Ok(None);
    };
    let encoded_text = &rest2[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => match base64::engine::general_purpose::STANDARD.decode(encoded_text) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None),
        },
        "Q" | "q" => match decode_q_encoding(encoded_text) {
            Some(bytes) => bytes,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };

    let text = decode_charset(charset, &bytes)?;
    Ok(Some(DecodedWord { text, consumed }))
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
///
/// Returns `None` on a truncated or non-hex escape.
fn decode_q_encoding(input: &str) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = input.get(i + 1..i + 3)?;
                result.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    Some(result)
}

/// Decode bytes using a named charset.
fn decode_charset(charset: &str, bytes: &[u8]) -> Result<String> {
    // RFC 2231 language suffix: "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(charset);
    match charset.to_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(bytes);
                Ok(decoded.into_owned())
            } else {
                warn!(charset = charset, "Unknown charset in encoded-word");
                Err(HeaderError::DecodeFailure(format!(
                    "unknown charset {charset:?}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_encoded_word() {
        let input = "=?UTF-8?B?SG9sYSBtdW5kbw==?=";
        assert_eq!(decode_header(input).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        let input = "=?ISO-8859-1?Q?caf=E9?=";
        assert_eq!(decode_header(input).unwrap(), "café");
    }

    #[test]
    fn test_decode_multiple_encoded_words() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode_header(input).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let input = "Re: =?UTF-8?B?SG9sYQ==?= there";
        assert_eq!(decode_header(input).unwrap(), "Re: Hola there");
    }

    #[test]
    fn test_decode_windows1252_encoded_word() {
        // Müller
        let input = "=?Windows-1252?Q?M=FCller?=";
        assert_eq!(decode_header(input).unwrap(), "Müller");
    }

    #[test]
    fn test_decode_utf8_base64_japanese() {
        // 山田太郎
        let input = "=?UTF-8?B?5bGx55Sw5aSq6YOO?=";
        assert_eq!(decode_header(input).unwrap(), "山田太郎");
    }

    #[test]
    fn test_decode_keeps_malformed_words_literal() {
        assert_eq!(decode_header("a =? b").unwrap(), "a =? b");
        assert_eq!(decode_header("=?utf-8?Q?bad=Z?=").unwrap(), "=?utf-8?Q?bad=Z?=");
        assert_eq!(decode_header("=?utf-8?B?***?=").unwrap(), "=?utf-8?B?***?=");
        assert_eq!(decode_header("=?utf-8?X?abc?=").unwrap(), "=?utf-8?X?abc?=");
    }

    #[test]
    fn test_decode_unknown_charset_fails() {
        let result = decode_header("=?x-no-such-charset?Q?hello?= <a@example.com>");
        assert!(matches!(result, Err(HeaderError::DecodeFailure(_))));
    }

    #[test]
    fn test_encode_ascii_passes_through() {
        assert_eq!(encode_header("Hello, world?"), "Hello, world?");
        assert_eq!(encode_header(""), "");
    }

    #[test]
    fn test_encode_non_ascii() {
        assert_eq!(encode_header("Café"), "=?utf-8?q?Caf=C3=A9?=");
        assert_eq!(encode_header("a é"), "=?utf-8?q?a_=C3=A9?=");
    }

    #[test]
    fn test_encode_splits_long_values() {
        let text = "ü".repeat(40);
        let encoded = encode_header(&text);
        let words: Vec<_> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        for word in &words {
            assert!(word.len() <= MAX_WORD_LEN, "word too long: {word}");
            assert!(word.starts_with(WORD_PREFIX) && word.ends_with(WORD_SUFFIX));
        }
        assert_eq!(decode_header(&encoded).unwrap(), text);
    }

    #[test]
    fn test_encode_decode_specials() {
        let text = "\"Døe, J\" (x) = ?_";
        assert_eq!(decode_header(&encode_header(text)).unwrap(), text);
    }

    #[test]
    fn test_closure_decoder() {
        let failing = |_: &str| -> Result<String> { Err(HeaderError::DecodeFailure("forced".into())) };
        assert!(failing.decode("x").is_err());
        assert_eq!(Rfc2047Decoder.decode("plain").unwrap(), "plain");
    }
}
