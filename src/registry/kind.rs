//! SubmissionKind - composed renderer table + registry snapshot
//!
//! A kind is declared with a [`KindBuilder`] and composed once over its
//! parent kind. The result is immutable and shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::field::FieldValue;
use crate::store::FieldStore;

use super::output::{OutputKey, OutputType, Registry};

/// Computes a field (or a deferred field's placeholder)
pub type RenderFn = Arc<dyn Fn(&mut FieldStore) -> anyhow::Result<FieldValue> + Send + Sync>;

/// Turns a deferred field's placeholder into its real value
pub type FinalizeFn =
    Arc<dyn Fn(&mut FieldStore, FieldValue) -> anyhow::Result<FieldValue> + Send + Sync>;

/// Picks a narrower kind from the values resolved so far
pub type NarrowFn =
    Arc<dyn Fn(&mut FieldStore) -> anyhow::Result<Arc<SubmissionKind>> + Send + Sync>;

/// Table entry for one field
#[derive(Clone)]
pub struct Renderer {
    pub render: RenderFn,
    /// Present for deferred (side-effecting) fields
    pub finalize: Option<FinalizeFn>,
}

impl Renderer {
    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.finalize.is_some()
    }
}

/// Immutable composed submission type
pub struct SubmissionKind {
    name: Arc<str>,
    /// This kind first, root kind last
    lineage: Vec<Arc<str>>,
    renderers: FxHashMap<Arc<str>, Renderer>,
    registry: Registry,
    default_fields: Vec<Arc<str>>,
    narrow: Option<NarrowFn>,
}

impl SubmissionKind {
    pub fn builder(name: &str) -> KindBuilder {
        KindBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lineage(&self) -> &[Arc<str>] {
        &self.lineage
    }

    /// Whether this kind is `name` or derives from it
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage.iter().any(|k| k.as_ref() == name)
    }

    pub fn renderer(&self, field: &str) -> Option<&Renderer> {
        self.renderers.get(field)
    }

    pub fn has_renderer(&self, field: &str) -> bool {
        self.renderers.contains_key(field)
    }

    pub fn is_deferred(&self, field: &str) -> bool {
        self.renderers.get(field).is_some_and(Renderer::is_deferred)
    }

    /// Fields tagged deferred, sorted by name
    pub fn deferred_fields(&self) -> Vec<Arc<str>> {
        let mut fields: Vec<Arc<str>> = self
            .renderers
            .iter()
            .filter(|(_, r)| r.is_deferred())
            .map(|(name, _)| Arc::clone(name))
            .collect();
        fields.sort();
        fields
    }

    /// All renderable fields, sorted by name
    pub fn renderer_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.renderers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn default_fields(&self) -> &[Arc<str>] {
        &self.default_fields
    }

    pub fn narrower(&self) -> Option<&NarrowFn> {
        self.narrow.as_ref()
    }
}

impl fmt::Debug for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionKind")
            .field("name", &self.name)
            .field("lineage", &self.lineage)
            .field("renderers", &self.renderer_names())
            .field("registry", &self.registry.len())
            .finish()
    }
}

/// Declarations of one kind, before composition
pub struct KindBuilder {
    name: Arc<str>,
    renderers: FxHashMap<Arc<str>, Renderer>,
    registry: Registry,
    default_fields: Option<Vec<Arc<str>>>,
    narrow: Option<NarrowFn>,
}

impl KindBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            renderers: FxHashMap::default(),
            registry: Registry::new(),
            default_fields: None,
            narrow: None,
        }
    }

    /// Declare a pure renderer
    pub fn render<F>(mut self, field: &str, f: F) -> Self
    where
        F: Fn(&mut FieldStore) -> anyhow::Result<FieldValue> + Send + Sync + 'static,
    {
        self.renderers.insert(
            Arc::from(field),
            Renderer {
                render: Arc::new(f),
                finalize: None,
            },
        );
        self
    }

    /// Declare a deferred field: a cheap placeholder renderer plus the
    /// side-effecting computation run by `finalize()`
    pub fn deferred<R, F>(mut self, field: &str, render: R, finalize: F) -> Self
    where
        R: Fn(&mut FieldStore) -> anyhow::Result<FieldValue> + Send + Sync + 'static,
        F: Fn(&mut FieldStore, FieldValue) -> anyhow::Result<FieldValue> + Send + Sync + 'static,
    {
        self.renderers.insert(
            Arc::from(field),
            Renderer {
                render: Arc::new(render),
                finalize: Some(Arc::new(finalize)),
            },
        );
        self
    }

    /// Map a field to a literal output key
    pub fn output(self, field: &str, key: &str, output: OutputType) -> Self {
        self.output_with(field, OutputKey::literal(key), output)
    }

    /// Map a field to an arbitrary output key (e.g. a generator)
    pub fn output_with(mut self, field: &str, key: OutputKey, output: OutputType) -> Self {
        self.registry.register(field, key, output);
        self
    }

    /// Fields displayed when the host requests none explicitly
    pub fn default_fields(mut self, fields: &[&str]) -> Self {
        self.default_fields = Some(fields.iter().map(|f| Arc::from(*f)).collect());
        self
    }

    /// Rule choosing a narrower kind (not inherited by child kinds)
    pub fn narrow<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut FieldStore) -> anyhow::Result<Arc<SubmissionKind>> + Send + Sync + 'static,
    {
        self.narrow = Some(Arc::new(f));
        self
    }

    /// Compose over `parent` into an immutable snapshot
    pub fn build(self, parent: Option<&SubmissionKind>) -> Arc<SubmissionKind> {
        let Some(parent) = parent else {
            return Arc::new(SubmissionKind {
                lineage: vec![Arc::clone(&self.name)],
                name: self.name,
                renderers: self.renderers,
                registry: self.registry,
                default_fields: self.default_fields.unwrap_or_default(),
                narrow: self.narrow,
            });
        };

        let mut renderers = parent.renderers.clone();
        for (field, renderer) in self.renderers {
            if renderers.contains_key(&field) {
                debug!(kind = %self.name, parent = %parent.name, field = %field, "renderer overridden");
            }
            renderers.insert(field, renderer);
        }

        let mut lineage = Vec::with_capacity(parent.lineage.len() + 1);
        lineage.push(Arc::clone(&self.name));
        lineage.extend(parent.lineage.iter().cloned());

        Arc::new(SubmissionKind {
            name: self.name,
            lineage,
            renderers,
            registry: Registry::compose(&parent.registry, &self.registry),
            default_fields: self
                .default_fields
                .unwrap_or_else(|| parent.default_fields.clone()),
            narrow: self.narrow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> Arc<SubmissionKind> {
        SubmissionKind::builder("base")
            .render("form_submit", |_| Ok(FieldValue::text("true")))
            .render("category", |_| anyhow::bail!("base has no category"))
            .deferred(
                "torrentfile",
                |_| Ok(FieldValue::text("/tmp/a.torrent")),
                |_, placeholder| Ok(placeholder),
            )
            .output("form_submit", "submit", OutputType::Text)
            .default_fields(&["form_title"])
            .build(None)
    }

    #[test]
    fn child_inherits_and_overrides() {
        let base = parent();
        let child = SubmissionKind::builder("video")
            .render("category", |_| Ok(FieldValue::text("movie")))
            .output("form_title", "title", OutputType::Text)
            .build(Some(&*base));

        assert_eq!(child.name(), "video");
        assert!(child.is_a("base"));
        assert!(child.is_a("video"));
        assert!(!base.is_a("video"));
        assert!(child.has_renderer("form_submit"));
        assert_eq!(child.registry().len(), 2);
        assert_eq!(child.default_fields().len(), 1);

        let mut store = FieldStore::new(Arc::clone(&child));
        assert_eq!(store.get("category").unwrap(), FieldValue::text("movie"));
    }

    #[test]
    fn deferred_fields_are_tagged() {
        let base = parent();
        assert!(base.is_deferred("torrentfile"));
        assert!(!base.is_deferred("form_submit"));
        assert!(!base.is_deferred("unknown"));
        assert_eq!(base.deferred_fields(), vec![Arc::<str>::from("torrentfile")]);
    }

    #[test]
    fn child_can_undefer_parent_field() {
        let base = parent();
        let child = SubmissionKind::builder("local")
            .render("torrentfile", |_| Ok(FieldValue::text("/srv/a.torrent")))
            .build(Some(&*base));
        assert!(!child.is_deferred("torrentfile"));
        assert!(child.deferred_fields().is_empty());
    }

    #[test]
    fn narrow_is_not_inherited() {
        let base = parent();
        let narrowing = SubmissionKind::builder("video")
            .narrow(|_| Ok(parent()))
            .build(Some(&*base));
        let leaf = SubmissionKind::builder("tv").build(Some(&*narrowing));
        assert!(narrowing.narrower().is_some());
        assert!(leaf.narrower().is_none());
    }
}
