//! DAG module - field dependency graph
//!
//! - `graph`: edges recorded during resolution, invalidation closure,
//!   finalization ordering and cycle detection

mod graph;

pub use graph::{DepVec, DependencyGraph};
