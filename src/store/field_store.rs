//! FieldStore - lazy, memoizing field resolver
//!
//! Single-owner design: the store lives inside one `Submission`, and
//! renderers receive `&mut FieldStore` so their reads go through [`get`].
//! The active-resolution stack attributes every read to the field currently
//! rendering, which is how dependency edges are discovered.
//!
//! [`get`]: FieldStore::get

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::dag::DependencyGraph;
use crate::error::{BitsError, Result};
use crate::field::FieldValue;
use crate::registry::SubmissionKind;

/// Memoizing resolver with dependency discovery and explicit invalidation
pub struct FieldStore {
    kind: Arc<SubmissionKind>,
    /// Cached values: field → value
    values: FxHashMap<Arc<str>, FieldValue>,
    graph: DependencyGraph,
    /// Fields currently rendering, outermost first
    active: Vec<Arc<str>>,
    /// Deferred fields holding a committed value
    finalized: FxHashSet<Arc<str>>,
    /// Renderer invocations so far
    renders: u64,
}

impl FieldStore {
    pub fn new(kind: Arc<SubmissionKind>) -> Self {
        Self {
            kind,
            values: FxHashMap::default(),
            graph: DependencyGraph::new(),
            active: Vec::new(),
            finalized: FxHashSet::default(),
            renders: 0,
        }
    }

    /// Create a store pre-seeded with literal fields (explicit user overrides)
    pub fn with_literals<I, K, V>(kind: Arc<SubmissionKind>, literals: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut store = Self::new(kind);
        for (field, value) in literals {
            store.values.insert(Arc::from(field.as_ref()), value.into());
        }
        store
    }

    /// Swap the renderer table, keeping values, edges and finalization marks
    pub(crate) fn replace_kind(&mut self, kind: Arc<SubmissionKind>) -> Arc<SubmissionKind> {
        std::mem::replace(&mut self.kind, kind)
    }

    pub fn kind(&self) -> &Arc<SubmissionKind> {
        &self.kind
    }

    /// Resolve `field`, rendering it (and whatever it reads) on a cache miss.
    ///
    /// When called from inside a renderer, records `caller → field` first,
    /// even if `field` turns out to be cached or undefined.
    pub fn get(&mut self, field: &str) -> Result<FieldValue> {
        if let Some(pos) = self.active.iter().position(|f| f.as_ref() == field) {
            let mut path: Vec<&str> = self.active[pos..].iter().map(|f| f.as_ref()).collect();
            path.push(field);
            return Err(BitsError::ResolutionCycle {
                cycle: path.join(" → "),
            });
        }

        let field: Arc<str> = Arc::from(field);
        if let Some(caller) = self.active.last().cloned() {
            if self.graph.record(&caller, &field) {
                trace!(caller = %caller, field = %field, "dependency recorded");
            }
        }

        if let Some(value) = self.values.get(&field) {
            return Ok(value.clone());
        }

        let render = match self.kind.renderer(&field) {
            Some(renderer) => Arc::clone(&renderer.render),
            None => {
                return Err(BitsError::FieldUndefined {
                    field: field.to_string(),
                    kind: self.kind.name().to_string(),
                })
            }
        };

        // edges are rebuilt from this resolution
        self.graph.clear_dependencies(&field);
        self.active.push(Arc::clone(&field));
        debug!(field = %field, depth = self.active.len(), "rendering field");

        let result = render(self);

        self.active.pop();
        self.renders += 1;

        match result {
            Ok(value) => {
                self.values.insert(field, value.clone());
                Ok(value)
            }
            Err(source) => {
                debug!(field = %field, error = %source, "render failed");
                Err(BitsError::FieldRender {
                    field: field.to_string(),
                    source,
                })
            }
        }
    }

    /// Like [`get`](Self::get), but an undefined field yields `None`.
    ///
    /// The read is still recorded, so a later `set` of the field reaches
    /// the caller.
    pub fn get_opt(&mut self, field: &str) -> Result<Option<FieldValue>> {
        match self.get(field) {
            Ok(value) => Ok(Some(value)),
            Err(BitsError::FieldUndefined { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cached value without resolving or recording a read
    pub fn peek(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn is_cached(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Names of all cached fields, sorted
    pub fn cached_fields(&self) -> Vec<Arc<str>> {
        let mut fields: Vec<Arc<str>> = self.values.keys().cloned().collect();
        fields.sort();
        fields
    }

    /// Explicitly override `field`: invalidate it, then store `value`
    /// without running its renderer.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.invalidate(field);
        let field: Arc<str> = Arc::from(field);
        // a literal depends on nothing
        self.graph.clear_dependencies(&field);
        self.values.insert(field, value.into());
    }

    /// Evict every transitive dependent of `field`, then `field` itself.
    ///
    /// Returns the fields that actually held a cached value.
    pub fn invalidate(&mut self, field: &str) -> Vec<Arc<str>> {
        let mut targets = self.graph.transitive_dependents(field);
        targets.push(Arc::from(field));

        let mut evicted = Vec::new();
        for target in targets {
            self.finalized.remove(&target);
            if self.values.remove(&target).is_some() {
                evicted.push(target);
            }
        }

        if !evicted.is_empty() {
            debug!(field = %field, evicted = evicted.len(), "invalidated");
        }
        evicted
    }

    /// Record an edge a renderer cannot express through `get`
    pub fn depend_on(&mut self, dependent: &str, dependency: &str) {
        self.graph.record(&Arc::from(dependent), &Arc::from(dependency));
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Field currently rendering, if any
    pub fn active_field(&self) -> Option<&str> {
        self.active.last().map(|f| f.as_ref())
    }

    /// Number of renderer invocations so far
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn is_finalized(&self, field: &str) -> bool {
        self.finalized.contains(field)
    }

    /// Store a deferred field's real value and mark it finalized.
    ///
    /// Unlike `set`, the placeholder's outgoing edges are kept: the real
    /// value was derived from them, and a change upstream must evict it.
    pub(crate) fn commit_final(&mut self, field: &str, value: FieldValue) {
        self.invalidate(field);
        let field: Arc<str> = Arc::from(field);
        self.values.insert(Arc::clone(&field), value);
        self.finalized.insert(field);
    }
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStore")
            .field("kind", &self.kind.name())
            .field("cached", &self.cached_fields())
            .field("edges", &self.graph.edge_count())
            .field("renders", &self.renders)
            .finish()
    }
}

/// `Field {k}:\n\t{v}` listing of the cached fields
impl fmt::Display for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in self.cached_fields() {
            writeln!(f, "Field {}:\n\t{}\n", field, self.values[&field])?;
        }
        Ok(())
    }
}
