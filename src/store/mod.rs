//! Store Module - lazy field resolution state
//!
//! Single-owner storage for one submission's field values.
//!
//! Key types:
//! - `FieldStore`: memoizing resolver, dependency discovery, invalidation

mod field_store;

pub use field_store::FieldStore;
