//! Email address parsing and formatting (RFC 5322 §3.4).

use crate::error::{HeaderError, Result};
use crate::parser::encoded_word::encode_header;

/// A parsed email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Strictly parse an address list.
    ///
    /// Supported forms:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    /// - `"Team: a@b.com, c@d.com;"` (group members are flattened)
    ///
    /// Unlike a lenient splitter this rejects anything outside the grammar:
    /// comments, unbalanced brackets or quotes, missing `@`, and text that
    /// follows an address without a separating comma. A list made only of
    /// empty groups parses to an empty vector.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        ListParser::new(raw).parse()
    }

    /// Format for a header field.
    ///
    /// `<address>` without a display name, `Name <address>` when the name is
    /// a plain phrase, a quoted string otherwise. Non-ASCII names are
    /// additionally RFC 2047 encoded.
    pub fn to_header_value(&self) -> String {
        let angle = format!("<{}>", self.address);
        if self.display_name.is_empty() {
            return angle;
        }

        let name = if is_phrase(&self.display_name) {
            self.display_name.clone()
        } else {
            quote(&self.display_name)
        };

        if name.is_ascii() {
            format!("{name} {angle}")
        } else {
            format!("{} {angle}", encode_header(&name))
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Join addresses with `", "` for an address-list header field.
pub fn format_address_list(addrs: &[EmailAddress]) -> String {
    addrs
        .iter()
        .map(EmailAddress::to_header_value)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `true` if `name` can be written as a bare sequence of atoms.
fn is_phrase(name: &str) -> bool {
    name.split(' ')
        .all(|word| !word.is_empty() && word.chars().all(is_atom_char))
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// atext plus `.` (for dot-atoms and obsolete phrases) plus non-ASCII.
fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || "!#$%&'*+-/=?^_`{|}~.".contains(c)
        || (!c.is_ascii() && !c.is_whitespace() && !c.is_control())
}

fn fail(reason: impl Into<String>) -> HeaderError {
    HeaderError::AddressParseFailure(reason.into())
}

fn validate_dot_atom(s: &str, what: &str) -> Result<()> {
    if s.is_empty() {
        return Err(fail(format!("empty {what}")));
    }
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return Err(fail(format!("misplaced dot in {what} {s:?}")));
    }
    Ok(())
}

/// An atom or quoted string.
struct Word<'a> {
    /// Source text, quotes included.
    raw: &'a str,
    /// Unescaped content.
    value: String,
    quoted: bool,
}

/// Recursive-descent parser over an address-list header value.
struct ListParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ListParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse(mut self) -> Result<Vec<EmailAddress>> {
        let mut out = Vec::new();
        let mut found = false;

        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                // Empty list element (obsolete syntax)
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            self.parse_address(&mut out)?;
            found = true;

            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => {}
                Some(c) => return Err(fail(format!("unexpected {c:?} after address"))),
            }
        }

        if !found {
            return Err(fail("no address"));
        }
        Ok(out)
    }

    /// A mailbox, or a group whose members are appended to `out`.
    fn parse_address(&mut self, out: &mut Vec<EmailAddress>) -> Result<()> {
        let words = self.parse_words()?;
        self.skip_ws();
        if self.peek() == Some(':') {
            if words.is_empty() {
                return Err(fail("group without a display name"));
            }
            self.bump();
            return self.parse_group_members(out);
        }
        out.push(self.finish_mailbox(words)?);
        Ok(())
    }

    fn parse_group_members(&mut self, out: &mut Vec<EmailAddress>) -> Result<()> {
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(fail("missing ';' at end of group")),
                Some(';') => {
                    self.bump();
                    return Ok(());
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let words = self.parse_words()?;
            out.push(self.finish_mailbox(words)?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(';') => {}
                Some(c) => return Err(fail(format!("unexpected {c:?} in group"))),
                None => return Err(fail("missing ';' at end of group")),
            }
        }
    }

    /// Complete a mailbox once its leading words are consumed: either a
    /// display name followed by `<addr-spec>`, or a local part followed by `@`.
    fn finish_mailbox(&mut self, words: Vec<Word<'a>>) -> Result<EmailAddress> {
        self.skip_ws();
        match self.peek() {
            Some('<') => {
                let address = self.parse_angle_addr()?;
                let display_name = words
                    .iter()
                    .map(|w| w.value.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(EmailAddress::new(display_name, address))
            }
            Some('@') => {
                let local = match words.as_slice() {
                    [word] => word,
                    [] => return Err(fail("missing local part")),
                    _ => return Err(fail("local part contains whitespace")),
                };
                if !local.quoted {
                    validate_dot_atom(local.raw, "local part")?;
                }
                self.bump();
                let domain = self.parse_domain()?;
                Ok(EmailAddress::new("", format!("{}@{}", local.raw, domain)))
            }
            Some(c) => Err(fail(format!("unexpected {c:?} in address"))),
            None if words.is_empty() => Err(fail("no address")),
            None => Err(fail("missing '@' in address")),
        }
    }

    fn parse_words(&mut self) -> Result<Vec<Word<'a>>> {
        let mut words = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('"') => words.push(self.parse_quoted()?),
                Some(c) if is_atom_char(c) => words.push(self.parse_atom()),
                _ => break,
            }
        }
        Ok(words)
    }

    fn parse_atom(&mut self) -> Word<'a> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_atom_char(c)) {
            self.bump();
        }
        let raw = &self.input[start..self.pos];
        Word {
            raw,
            value: raw.to_string(),
            quoted: false,
        }
    }

    fn parse_quoted(&mut self) -> Result<Word<'a>> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(fail("unterminated quoted string")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(fail("unterminated quoted string")),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(Word {
            raw: &self.input[start..self.pos],
            value,
            quoted: true,
        })
    }

    fn parse_angle_addr(&mut self) -> Result<String> {
        self.bump();
        self.skip_ws();
        if self.peek() == Some('>') {
            return Err(fail("empty angle address"));
        }
        let address = self.parse_addr_spec()?;
        self.skip_ws();
        match self.bump() {
            Some('>') => Ok(address),
            Some(c) => Err(fail(format!("unexpected {c:?} in angle address"))),
            None => Err(fail("missing closing '>'")),
        }
    }

    fn parse_addr_spec(&mut self) -> Result<String> {
        let local = match self.peek() {
            Some('"') => self.parse_quoted()?,
            Some(c) if is_atom_char(c) => self.parse_atom(),
            Some(c) => return Err(fail(format!("unexpected {c:?} in address"))),
            None => return Err(fail("missing closing '>'")),
        };
        if !local.quoted {
            validate_dot_atom(local.raw, "local part")?;
        }
        self.skip_ws();
        match self.bump() {
            Some('@') => {}
            Some(c) => return Err(fail(format!("expected '@', found {c:?}"))),
            None => return Err(fail("missing '@' in address")),
        }
        let domain = self.parse_domain()?;
        Ok(format!("{}@{}", local.raw, domain))
    }

    fn parse_domain(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let start = self.pos;
        if self.peek() == Some('[') {
            self.bump();
            loop {
                match self.bump() {
                    Some(']') => break,
                    Some('[') | Some('\\') | None => {
                        return Err(fail("malformed domain literal"));
                    }
                    Some(_) => {}
                }
            }
            return Ok(&self.input[start..self.pos]);
        }

        while matches!(self.peek(), Some(c) if is_atom_char(c)) {
            self.bump();
        }
        let domain = &self.input[start..self.pos];
        validate_dot_atom(domain, "domain")?;
        Ok(domain)
    }
}
