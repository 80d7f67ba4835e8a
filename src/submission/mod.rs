//! Submission Module - document assembly on top of the field store
//!
//! - `core`: validation, display, narrowing, payload
//! - `finalize`: pending deferred fields and the finalization pass

mod core;
mod finalize;

pub use self::core::Submission;
