//! Payload Module - output document assembly
//!
//! Walks a kind's composed registry and encodes resolved values as
//! `text`, `checkbox` or `file` entries.

mod document;

pub use document::{FilePart, Payload, CHECKBOX_ON, OCTET_STREAM};
