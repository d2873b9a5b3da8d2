//! Inbound side: RFC 2047 decoding, date parsing, address sanitizing and
//! header-to-message parsing.

pub mod date;
pub mod encoded_word;
pub mod header;
pub mod sanitize;
