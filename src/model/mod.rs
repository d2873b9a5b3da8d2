//! Core data model types: messages, attachments, addresses and header blocks.

pub mod address;
pub mod attachment;
pub mod header_map;
pub mod message;
