//! `hdrbridge`: translation between message metadata and MIME header blocks.
//!
//! The [`builder`] turns a [`Message`](model::message::Message) into outbound
//! header fields, injecting the provider's tracking IDs into `Message-Id` and
//! `References`. The [`parser`] goes the other way for inbound mail and
//! tolerates malformed address lists by recovering the bracketed mailboxes.

pub mod builder;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
