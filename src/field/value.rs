//! FieldValue - the opaque typed value a field resolves to
//!
//! Literal fields arrive from the host as YAML/JSON and are converted
//! through [`FieldValue::from_json`]. Renderers build values directly.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

/// Value held by a resolved field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<FieldValue>),
    /// Structured collaborator result (e.g. a parsed release name)
    Record(BTreeMap<String, FieldValue>),
    /// Reference to file content on local disk
    Path(PathBuf),
}

impl FieldValue {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Build a list of text values
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }

    /// Convert a JSON value (from YAML or JSON literals)
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Text(n.to_string()),
            },
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Record(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Truthiness used by validation and checkbox encoding: null, false, 0,
    /// empty text and empty collections are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Text(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Record(map) => !map.is_empty(),
            Self::Path(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Path this value references (text values are treated as paths)
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Text(s) if !s.is_empty() => Some(Path::new(s)),
            _ => None,
        }
    }

    /// Look up a key of a record value
    pub fn key(&self, key: &str) -> Option<&FieldValue> {
        self.as_record().and_then(|map| map.get(key))
    }
}

/// Text form used for payload `text` encoding and field display
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Self::Record(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<PathBuf> for FieldValue {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_of_empty_values() {
        assert!(!FieldValue::Null.is_truthy());
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(!FieldValue::Int(0).is_truthy());
        assert!(!FieldValue::text("").is_truthy());
        assert!(!FieldValue::List(vec![]).is_truthy());
        assert!(FieldValue::text("x").is_truthy());
        assert!(FieldValue::Path(PathBuf::from("a.torrent")).is_truthy());
    }

    #[test]
    fn from_json_converts_nested() {
        let value = FieldValue::from_json(json!({"genres": ["drama", "crime"], "season": 2}));
        let record = value.as_record().unwrap();
        assert_eq!(record["season"], FieldValue::Int(2));
        assert_eq!(record["genres"], FieldValue::text_list(["drama", "crime"]));
    }

    #[test]
    fn display_text_forms() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::text_list(["a", "b"]).to_string(), "a, b");
        assert_eq!(FieldValue::Path(PathBuf::from("/x/y.torrent")).to_string(), "/x/y.torrent");
    }

    #[test]
    fn text_doubles_as_path() {
        let value = FieldValue::text("/tmp/file.torrent");
        assert_eq!(value.as_path(), Some(Path::new("/tmp/file.torrent")));
        assert!(FieldValue::text("").as_path().is_none());
    }

    #[test]
    fn as_int_parses_text() {
        assert_eq!(FieldValue::text(" 4 ").as_int(), Some(4));
        assert_eq!(FieldValue::Int(7).as_int(), Some(7));
        assert_eq!(FieldValue::Bool(true).as_int(), None);
    }
}
