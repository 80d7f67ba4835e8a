//! Payload - final `{data, files}` document built from the registry

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{BitsError, Result};
use crate::field::FieldValue;
use crate::registry::{OutputKey, OutputType};
use crate::store::FieldStore;

/// Content type of every file part
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Checkbox value for truthy fields
pub const CHECKBOX_ON: &str = "on";

/// File attachment read from local disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePart {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FilePart {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Output document handed to the payload consumer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Payload {
    pub data: BTreeMap<String, String>,
    pub files: BTreeMap<String, FilePart>,
}

impl Payload {
    /// Walk the store's composed registry and encode every mapped field.
    ///
    /// Resolves fields through the store (cached values are reused), reads
    /// file content for `file` entries and nothing else.
    pub fn build(store: &mut FieldStore) -> Result<Self> {
        let kind = Arc::clone(store.kind());
        let mut payload = Self::default();

        for entry in kind.registry().iter() {
            let value = store.get(&entry.field)?;
            match &entry.key {
                OutputKey::Literal(key) => {
                    payload.encode(&entry.field, key, entry.output, &value)?;
                }
                OutputKey::Generated(gen) => {
                    let items = match value {
                        FieldValue::List(items) => items,
                        single => vec![single],
                    };
                    for (i, item) in items.iter().enumerate() {
                        let key = gen(i, item);
                        payload.encode(&entry.field, &key, entry.output, item)?;
                    }
                }
            }
        }

        debug!(
            kind = %kind.name(),
            data = payload.data.len(),
            files = payload.files.len(),
            "payload built"
        );
        Ok(payload)
    }

    fn encode(&mut self, field: &str, key: &str, output: OutputType, value: &FieldValue) -> Result<()> {
        match output {
            OutputType::Text => {
                self.data.insert(key.to_string(), value.to_string());
            }
            OutputType::Checkbox => {
                if value.is_truthy() {
                    self.data.insert(key.to_string(), CHECKBOX_ON.to_string());
                }
            }
            OutputType::File => {
                let part = read_part(field, value)?;
                self.files.insert(key.to_string(), part);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.files.is_empty()
    }

    /// Human-readable dump: every entry under a centered `==  key  ==` banner
    pub fn preview(&self, width: usize) -> String {
        let mut out = String::new();
        for (key, value) in &self.data {
            let _ = writeln!(out, "{}", banner(key, width));
            let _ = writeln!(out, "{}", value);
        }
        for (key, part) in &self.files {
            let _ = writeln!(out, "{}", banner(key, width));
            let _ = writeln!(out, "{} ({} bytes, {})", part.filename, part.len(), part.content_type);
        }
        out
    }
}

fn banner(key: &str, width: usize) -> String {
    let label = format!("  {}  ", key);
    format!("{:=^width$}", label, width = width)
}

fn read_part(field: &str, value: &FieldValue) -> Result<FilePart> {
    let Some(path) = value.as_path() else {
        return Err(BitsError::PayloadFile {
            field: field.to_string(),
            path: PathBuf::from(value.to_string()),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "value does not reference a file",
            ),
        });
    };

    let bytes = std::fs::read(path).map_err(|source| BitsError::PayloadFile {
        field: field.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(FilePart {
        filename,
        bytes,
        content_type: OCTET_STREAM.to_string(),
    })
}
