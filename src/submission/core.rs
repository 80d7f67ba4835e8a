//! Submission - one document under assembly
//!
//! Owns the field store (and through it the kind, registry and graph).
//! Validation, display and narrowing live here; finalization is in
//! `finalize.rs`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BitsError, Result};
use crate::field::FieldValue;
use crate::payload::Payload;
use crate::registry::SubmissionKind;
use crate::store::FieldStore;

/// A submission of one kind, holding its resolved fields
#[derive(Debug)]
pub struct Submission {
    pub(super) store: FieldStore,
}

impl Submission {
    pub fn new(kind: Arc<SubmissionKind>) -> Self {
        Self {
            store: FieldStore::new(kind),
        }
    }

    /// Create a submission whose store is seeded with literal fields
    pub fn with_literals<I, K, V>(kind: Arc<SubmissionKind>, literals: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        Self {
            store: FieldStore::with_literals(kind, literals),
        }
    }

    pub fn kind(&self) -> &Arc<SubmissionKind> {
        self.store.kind()
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FieldStore {
        &mut self.store
    }

    pub fn get(&mut self, field: &str) -> Result<FieldValue> {
        self.store.get(field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.store.set(field, value);
    }

    pub fn invalidate(&mut self, field: &str) {
        self.store.invalidate(field);
    }

    /// Resolve `fields` and check that each one is defined and truthy.
    ///
    /// All problems are collected before failing, so the error names every
    /// offending field at once.
    pub fn validate<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let mut missing: Vec<String> = Vec::new();
        let mut empty: Vec<String> = Vec::new();

        for field in fields {
            let field = field.as_ref();
            match self.store.get(field) {
                Ok(value) if value.is_truthy() => {}
                Ok(value) => {
                    warn!(field = %field, value = %value, "field resolved to an empty value");
                    empty.push(format!("Value of key {} is {:?}", field, value));
                    missing.push(field.to_string());
                }
                Err(e @ (BitsError::FieldUndefined { .. } | BitsError::FieldRender { .. })) => {
                    warn!(field = %field, error = %e, "field unavailable");
                    missing.push(field.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        let mut details = format!("Missing field(s) ({})", missing.join(", "));
        for line in empty {
            details.push_str("; ");
            details.push_str(&line);
        }
        Err(BitsError::InvalidSubmission {
            fields: missing,
            details,
        })
    }

    /// Validate `fields` (or the kind's default fields when empty) and
    /// render them as `Field {k}:\n\t{v}` blocks.
    pub fn show_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<String> {
        let fields: Vec<String> = if fields.is_empty() {
            self.kind()
                .default_fields()
                .iter()
                .map(|f| f.to_string())
                .collect()
        } else {
            fields.iter().map(|f| f.as_ref().to_string()).collect()
        };

        self.validate(&fields)?;

        let mut out = String::new();
        for field in &fields {
            let value = self.store.get(field)?;
            out.push_str(&format!("Field {}:\n\t{}\n\n", field, value));
        }
        Ok(out)
    }

    /// Replace the kind with the one its narrowing rule picks.
    ///
    /// Cached values, dependency edges and finalization marks are carried
    /// over unchanged. Returns false when the kind has no rule or the rule
    /// picks the same kind.
    pub fn subcategorise(&mut self) -> Result<bool> {
        let Some(narrow) = self.kind().narrower().cloned() else {
            return Ok(false);
        };

        let narrower = narrow(&mut self.store).map_err(|source| match source.downcast::<BitsError>() {
            Ok(e) => e,
            Err(source) => BitsError::FieldRender {
                field: "kind".to_string(),
                source,
            },
        })?;

        if narrower.name() == self.kind().name() {
            return Ok(false);
        }

        let previous = self.store.replace_kind(narrower);
        debug!(from = %previous.name(), to = %self.kind().name(), "submission narrowed");
        Ok(true)
    }

    /// `show_fields`, narrowing the kind and retrying while validation fails.
    ///
    /// The validation error is returned once narrowing stops changing the
    /// kind.
    pub fn resolve_narrowing<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<String> {
        loop {
            match self.show_fields(fields) {
                Err(err @ BitsError::InvalidSubmission { .. }) => {
                    if !self.subcategorise()? {
                        return Err(err);
                    }
                }
                other => return other,
            }
        }
    }

    /// Build the payload from current values.
    ///
    /// Pending deferred fields still hold placeholders; call
    /// [`finalize`](Self::finalize) first to get real values.
    pub fn payload(&mut self) -> Result<Payload> {
        let pending = self.pending();
        if !pending.is_empty() {
            warn!(pending = ?pending, "building payload before finalization");
        }
        Payload::build(&mut self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KindBuilder;

    fn kind() -> Arc<SubmissionKind> {
        KindBuilder::new("t")
            .render("x", |_| Ok(FieldValue::text("rendered x")))
            .render("zero", |_| Ok(FieldValue::Int(0)))
            .render("broken", |_| anyhow::bail!("lookup failed"))
            .default_fields(&["x"])
            .build(None)
    }

    #[test]
    fn test_validate_names_missing_field() {
        let mut sub = Submission::new(kind());
        let err = sub.validate(&["x", "y"]).unwrap_err();
        match err {
            BitsError::InvalidSubmission { fields, details } => {
                assert_eq!(fields, vec!["y".to_string()]);
                assert_eq!(details, "Missing field(s) (y)");
            }
            other => panic!("unexpected error: {other}"),
        }
        // x was still resolved
        assert!(sub.store().is_cached("x"));
    }

    #[test]
    fn test_validate_collects_falsy_and_failed() {
        let mut sub = Submission::new(kind());
        let err = sub.validate(&["zero", "broken", "x"]).unwrap_err();
        let BitsError::InvalidSubmission { fields, details } = err else {
            panic!("expected InvalidSubmission");
        };
        assert_eq!(fields, vec!["zero".to_string(), "broken".to_string()]);
        assert!(details.contains("Value of key zero is Int(0)"), "{details}");
    }

    #[test]
    fn test_show_fields_uses_defaults() {
        let mut sub = Submission::new(kind());
        let shown = sub.show_fields::<&str>(&[]).unwrap();
        assert_eq!(shown, "Field x:\n\trendered x\n\n");
    }

    #[test]
    fn test_subcategorise_without_rule_keeps_kind() {
        let mut sub = Submission::new(kind());
        assert!(!sub.subcategorise().unwrap());
        assert_eq!(sub.kind().name(), "t");
    }

    #[test]
    fn test_resolve_narrowing_switches_kind() {
        let base = KindBuilder::new("base").build(None);
        let leaf = KindBuilder::new("leaf")
            .render("form_title", |s| {
                let title = s.get("title")?;
                Ok(FieldValue::text(format!("{title} (leaf)")))
            })
            .build(Some(&*base));
        let leaf_for_rule = Arc::clone(&leaf);
        let root = KindBuilder::new("root")
            .narrow(move |_| Ok(Arc::clone(&leaf_for_rule)))
            .build(Some(&*base));

        let mut sub = Submission::with_literals(root, [("title", "Ramen")]);
        let shown = sub.resolve_narrowing(&["form_title"]).unwrap();
        assert_eq!(sub.kind().name(), "leaf");
        assert_eq!(shown, "Field form_title:\n\tRamen (leaf)\n\n");

        // leaf has no rule: a miss is re-raised
        let err = sub.resolve_narrowing(&["nope"]).unwrap_err();
        assert_eq!(err.code(), "BITS-010");
    }
}
