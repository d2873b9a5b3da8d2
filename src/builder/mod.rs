//! Outbound side: message and part headers for MIME serialization.

pub mod header;
pub mod part;

pub use header::{build_header, write_header_fields, IdDomains};
pub use part::{
    attachment_header, body_header, boundary, related_boundary, related_header,
    set_body_content_fields,
};
