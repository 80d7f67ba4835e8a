//! Registry module - per-kind output mapping and renderer tables
//!
//! - `output`: field → (output key, encoding), composed with override-wins
//! - `kind`: renderer table + registry snapshot for one submission kind

mod kind;
mod output;

pub use kind::{FinalizeFn, KindBuilder, NarrowFn, RenderFn, Renderer, SubmissionKind};
pub use output::{KeyGenerator, OutputKey, OutputType, Registry, RegistryEntry};
