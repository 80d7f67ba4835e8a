//! Finalizer - dependency-ordered execution of deferred fields
//!
//! Deferred fields first resolve to a cheap placeholder. `finalize()`
//! replaces each pending placeholder with the result of the field's
//! side-effecting computation. The commit evicts everything that embedded
//! the placeholder, so dependents re-render on next read.
//!
//! Ordering: dependencies first (see `DependencyGraph::finalization_order`).
//! A cycle is rejected before any side effect runs. A failure stops the run;
//! fields committed before it stay committed.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::{BitsError, Result};

use super::core::Submission;

impl Submission {
    /// Deferred fields currently cached and not yet finalized, by name
    pub fn pending(&self) -> Vec<Arc<str>> {
        self.kind()
            .deferred_fields()
            .into_iter()
            .filter(|f| self.store.is_cached(f) && !self.store.is_finalized(f))
            .collect()
    }

    pub fn needs_finalization(&self) -> bool {
        !self.pending().is_empty()
    }

    /// Run every pending deferred computation, in dependency order.
    ///
    /// Returns the fields committed by this call.
    #[instrument(skip(self), fields(kind = %self.kind().name()))]
    pub fn finalize(&mut self) -> Result<Vec<Arc<str>>> {
        let pending = self.pending();
        if pending.is_empty() {
            debug!("nothing to finalize");
            return Ok(Vec::new());
        }

        let order = self.store.graph().finalization_order(&pending)?;
        debug!(order = ?order, "finalization order");

        let kind = Arc::clone(self.kind());
        let mut committed = Vec::with_capacity(order.len());

        for field in order {
            let Some(finalize) = kind.renderer(&field).and_then(|r| r.finalize.clone()) else {
                continue;
            };

            // an earlier commit may have evicted this placeholder
            let placeholder = self.store.get(&field).map_err(|e| BitsError::Finalization {
                field: field.to_string(),
                source: e.into(),
            })?;

            let value = finalize(&mut self.store, placeholder).map_err(|source| {
                BitsError::Finalization {
                    field: field.to_string(),
                    source,
                }
            })?;

            self.store.commit_final(&field, value);
            info!(field = %field, "field finalized");
            committed.push(field);
        }

        Ok(committed)
    }
}
