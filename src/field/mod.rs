//! Field data model

mod value;

pub use value::FieldValue;
