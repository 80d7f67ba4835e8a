//! DependencyGraph - edges discovered while fields resolve
//!
//! Edges point from a dependent to the field it read:
//! `form_title → title` means the last resolution of `form_title` read `title`.
//!
//! Performance notes:
//! - Arc<str> shared with the store for zero-cost cloning of field names
//! - FxHashMap for faster hashing on short keys
//! - SmallVec for stack-allocated small edge lists (0-4 items)
//!
//! Finalization ordering:
//! - Kahn's algorithm, dependencies first, ties broken by field name
//! - Cycle reporting using DFS three-color algorithm

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{BitsError, Result};

/// Stack-allocated edge list: most fields read 0-4 others
pub type DepVec = SmallVec<[Arc<str>; 4]>;

/// Graph of field dependencies recorded by the store
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// dependent -> fields its last resolution read
    dependencies: FxHashMap<Arc<str>, DepVec>,
    /// dependency -> fields whose last resolution read it
    dependents: FxHashMap<Arc<str>, DepVec>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dependent → dependency`. Returns false if the edge already existed.
    pub fn record(&mut self, dependent: &Arc<str>, dependency: &Arc<str>) -> bool {
        let deps = self.dependencies.entry(Arc::clone(dependent)).or_default();
        if deps.iter().any(|d| d == dependency) {
            return false;
        }
        deps.push(Arc::clone(dependency));
        self.dependents
            .entry(Arc::clone(dependency))
            .or_default()
            .push(Arc::clone(dependent));
        true
    }

    /// Drop every outgoing edge of `dependent` (before it re-renders)
    pub fn clear_dependencies(&mut self, dependent: &str) {
        let Some(deps) = self.dependencies.remove(dependent) else {
            return;
        };
        for dep in deps {
            if let Some(readers) = self.dependents.get_mut(&dep) {
                readers.retain(|r| r.as_ref() != dependent);
                if readers.is_empty() {
                    self.dependents.remove(&dep);
                }
            }
        }
    }

    /// Fields the last resolution of `field` read
    #[inline]
    pub fn dependencies(&self, field: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.dependencies.get(field).map_or(EMPTY, SmallVec::as_slice)
    }

    /// Fields whose last resolution read `field`
    #[inline]
    pub fn dependents(&self, field: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.dependents.get(field).map_or(EMPTY, SmallVec::as_slice)
    }

    /// Every field that transitively read `field`, nearest first (BFS).
    /// `field` itself is not included.
    pub fn transitive_dependents(&self, field: &str) -> Vec<Arc<str>> {
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut out = Vec::new();

        visited.insert(field);
        queue.push_back(field);

        while let Some(current) = queue.pop_front() {
            for reader in self.dependents(current) {
                if visited.insert(reader.as_ref()) {
                    out.push(Arc::clone(reader));
                    queue.push_back(reader.as_ref());
                }
            }
        }

        out
    }

    /// Check if `from` transitively read `to` (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();

        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.dependencies(current) {
                if neighbor.as_ref() == to {
                    return true;
                }
                if visited.insert(neighbor.as_ref()) {
                    queue.push_back(neighbor.as_ref());
                }
            }
        }

        false
    }

    /// Number of recorded edges
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(SmallVec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Total order in which `deferred` fields can be finalized.
    ///
    /// The graph is restricted to `deferred` plus everything they transitively
    /// read. Kahn's algorithm runs over that subgraph with dependencies first
    /// (ties broken by field name), and the result is filtered back down to
    /// `deferred`. Any cycle in the subgraph is a `CyclicDependency`.
    ///
    /// This is deliberately the reverse of a readers-first order: a deferred
    /// field that reads another deferred field is finalized after it, so its
    /// finalize function sees the committed value rather than the placeholder.
    pub fn finalization_order(&self, deferred: &[Arc<str>]) -> Result<Vec<Arc<str>>> {
        let mut nodes: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut stack: Vec<Arc<str>> = deferred.to_vec();
        while let Some(field) = stack.pop() {
            if nodes.contains(&field) {
                continue;
            }
            for dep in self.dependencies(&field) {
                if !nodes.contains(dep) {
                    stack.push(Arc::clone(dep));
                }
            }
            nodes.insert(field);
        }

        let mut remaining: FxHashMap<Arc<str>, usize> = nodes
            .iter()
            .map(|n| {
                let count = self
                    .dependencies(n)
                    .iter()
                    .filter(|d| nodes.contains(*d))
                    .count();
                (Arc::clone(n), count)
            })
            .collect();

        let mut ready: BTreeSet<Arc<str>> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(n, _)| Arc::clone(n))
            .collect();
        let mut order: Vec<Arc<str>> = Vec::with_capacity(nodes.len());

        while let Some(next) = ready.pop_first() {
            for reader in self.dependents(&next) {
                if let Some(count) = remaining.get_mut(reader) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(Arc::clone(reader));
                    }
                }
            }
            order.push(next);
        }

        if order.len() < nodes.len() {
            let placed: FxHashSet<&str> = order.iter().map(|f| f.as_ref()).collect();
            let stuck: FxHashSet<Arc<str>> = nodes
                .iter()
                .filter(|n| !placed.contains(n.as_ref()))
                .cloned()
                .collect();
            let cycle = self.find_cycle(&stuck);
            let mut fields: Vec<String> = cycle.iter().map(|f| f.to_string()).collect();
            fields.sort();
            fields.dedup();
            let path: Vec<&str> = cycle.iter().map(|f| f.as_ref()).collect();
            return Err(BitsError::CyclicDependency {
                fields,
                cycle: path.join(" → "),
            });
        }

        let wanted: FxHashSet<&str> = deferred.iter().map(|f| f.as_ref()).collect();
        Ok(order
            .into_iter()
            .filter(|f| wanted.contains(f.as_ref()))
            .collect())
    }

    /// Find one cycle among `within` using DFS with three-color marking.
    ///
    /// Returns the cycle as a closed path (`a, b, a`), or the sorted `within`
    /// set if no explicit cycle is found.
    fn find_cycle(&self, within: &FxHashSet<Arc<str>>) -> Vec<Arc<str>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs(
            node: Arc<str>,
            graph: &DependencyGraph,
            within: &FxHashSet<Arc<str>>,
            colors: &mut FxHashMap<Arc<str>, Color>,
            stack: &mut Vec<Arc<str>>,
        ) -> Option<Vec<Arc<str>>> {
            colors.insert(Arc::clone(&node), Color::Gray);
            stack.push(Arc::clone(&node));

            for dep in graph.dependencies(&node) {
                if !within.contains(dep) {
                    continue;
                }
                match colors.get(dep).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        // dep is Gray, so it is on the current DFS path
                        let start = stack
                            .iter()
                            .position(|x| x == dep)
                            .unwrap_or(0);
                        let mut cycle: Vec<Arc<str>> = stack[start..].to_vec();
                        cycle.push(Arc::clone(dep));
                        return Some(cycle);
                    }
                    Color::White => {
                        if let Some(cycle) = dfs(Arc::clone(dep), graph, within, colors, stack) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }

            stack.pop();
            colors.insert(node, Color::Black);
            None
        }

        let mut sorted: Vec<Arc<str>> = within.iter().cloned().collect();
        sorted.sort();

        let mut colors: FxHashMap<Arc<str>, Color> = FxHashMap::default();
        let mut stack: Vec<Arc<str>> = Vec::new();

        for node in &sorted {
            if colors.get(node).copied().unwrap_or(Color::White) == Color::White {
                if let Some(cycle) = dfs(Arc::clone(node), self, within, &mut colors, &mut stack) {
                    return cycle;
                }
            }
        }

        sorted
    }
}
