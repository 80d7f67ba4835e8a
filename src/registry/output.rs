//! Registry - field name → (output key, output encoding)
//!
//! Each kind declares its own entries; [`Registry::compose`] layers them over
//! the parent kind's composed registry. Entry order is stable:
//! inherited entries keep their position, overrides replace in place and new
//! entries are appended.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::field::FieldValue;

/// Generates one output key per sequence element (zero-based index)
pub type KeyGenerator = Arc<dyn Fn(usize, &FieldValue) -> String + Send + Sync>;

/// How a field value is encoded in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// String form of the value
    Text,
    /// Omitted when falsy, `"on"` otherwise
    Checkbox,
    /// Attachment read from the referenced path
    File,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::File => "file",
        })
    }
}

/// Output key: a literal or a per-element generator
#[derive(Clone)]
pub enum OutputKey {
    Literal(Arc<str>),
    Generated(KeyGenerator),
}

impl OutputKey {
    pub fn literal(key: &str) -> Self {
        Self::Literal(Arc::from(key))
    }

    pub fn generated<F>(f: F) -> Self
    where
        F: Fn(usize, &FieldValue) -> String + Send + Sync + 'static,
    {
        Self::Generated(Arc::new(f))
    }
}

impl fmt::Debug for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(key) => write!(f, "Literal({:?})", key),
            Self::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(key) => f.write_str(key),
            Self::Generated(gen) => write!(f, "{}…", gen(0, &FieldValue::Null)),
        }
    }
}

/// One registry declaration
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub field: Arc<str>,
    pub key: OutputKey,
    pub output: OutputType,
}

/// Ordered, immutable-once-composed field → output mapping
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    /// field → position in `entries`
    index: FxHashMap<Arc<str>, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field's output mapping (a second declaration replaces the first)
    pub fn register(&mut self, field: &str, key: OutputKey, output: OutputType) {
        let entry = RegistryEntry {
            field: Arc::from(field),
            key,
            output,
        };
        self.insert(entry);
    }

    fn insert(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        match self.index.get(&entry.field) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entry)),
            None => {
                self.index.insert(Arc::clone(&entry.field), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Layer `child` over `parent`; the child's entry wins on collision.
    pub fn compose(parent: &Registry, child: &Registry) -> Registry {
        let mut composed = parent.clone();
        for entry in &child.entries {
            let field = Arc::clone(&entry.field);
            if let Some(previous) = composed.insert(entry.clone()) {
                warn!(
                    field = %field,
                    previous_key = %previous.key,
                    key = %entry.key,
                    "registry entry overridden by subtype"
                );
            }
        }
        composed
    }

    pub fn get(&self, field: &str) -> Option<&RegistryEntry> {
        self.index.get(field).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(registry: &Registry) -> Vec<&str> {
        registry.iter().map(|e| e.field.as_ref()).collect()
    }

    #[test]
    fn register_keeps_declaration_order() {
        let mut registry = Registry::new();
        registry.register("form_title", OutputKey::literal("title"), OutputType::Text);
        registry.register("scene", OutputKey::literal("scene"), OutputType::Checkbox);

        assert_eq!(fields(&registry), vec!["form_title", "scene"]);
        assert_eq!(registry.get("scene").unwrap().output, OutputType::Checkbox);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn compose_child_overrides_in_place() {
        let mut parent = Registry::new();
        parent.register("form_title", OutputKey::literal("title"), OutputType::Text);
        parent.register("tags", OutputKey::literal("tags"), OutputType::Text);

        let mut child = Registry::new();
        child.register("form_title", OutputKey::literal("name"), OutputType::Text);
        child.register("year", OutputKey::literal("year"), OutputType::Text);

        let composed = Registry::compose(&parent, &child);
        assert_eq!(fields(&composed), vec!["form_title", "tags", "year"]);
        assert_eq!(composed.get("form_title").unwrap().key.to_string(), "name");

        // parent snapshot untouched
        assert_eq!(parent.get("form_title").unwrap().key.to_string(), "title");
        assert_eq!(parent.len(), 2);
    }

    /// In-memory sink for formatted log lines
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn compose_logged(parent: &Registry, child: &Registry) -> String {
        let logs = LogBuffer::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, || Registry::compose(parent, child));

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn compose_warns_on_override() {
        let mut parent = Registry::new();
        parent.register("form_title", OutputKey::literal("title"), OutputType::Text);
        let mut child = Registry::new();
        child.register("form_title", OutputKey::literal("name"), OutputType::Text);

        let logs = compose_logged(&parent, &child);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("registry entry overridden by subtype"), "{logs}");
        assert!(logs.contains("previous_key=title"), "{logs}");
        assert!(logs.contains("key=name"), "{logs}");

        let mut disjoint = Registry::new();
        disjoint.register("year", OutputKey::literal("year"), OutputType::Text);
        assert!(compose_logged(&parent, &disjoint).is_empty());
    }

    #[test]
    fn generated_key_formats_elements() {
        let key = OutputKey::generated(|i, _| format!("screenshot{}", i + 1));
        let OutputKey::Generated(gen) = &key else {
            panic!("expected generator");
        };
        assert_eq!(gen(0, &FieldValue::Null), "screenshot1");
        assert_eq!(gen(4, &FieldValue::Null), "screenshot5");
        assert_eq!(key.to_string(), "screenshot1…");
    }
}
