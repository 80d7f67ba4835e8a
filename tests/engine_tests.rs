//! Integration tests for the field engine
//!
//! These tests drive the public API only: kinds declared with
//! `KindBuilder`, values resolved through `Submission`.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bitsmith::{BitsError, FieldValue, KindBuilder, OutputKey, OutputType, Submission, SubmissionKind};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// `c = a + b`, `d = c * 2`, `e` is unrelated; counts every render of `c`
fn arithmetic(renders: Arc<AtomicUsize>) -> Arc<SubmissionKind> {
    KindBuilder::new("arith")
        .render("c", move |s| {
            renders.fetch_add(1, Ordering::SeqCst);
            let a = s.get("a")?.as_int().unwrap_or(0);
            let b = s.get("b")?.as_int().unwrap_or(0);
            Ok(FieldValue::Int(a + b))
        })
        .render("d", |s| {
            let c = s.get("c")?.as_int().unwrap_or(0);
            Ok(FieldValue::Int(c * 2))
        })
        .render("e", |_| Ok(FieldValue::text("static")))
        .build(None)
}

fn arith_submission() -> (Submission, Arc<AtomicUsize>) {
    let renders = Arc::new(AtomicUsize::new(0));
    let sub = Submission::with_literals(
        arithmetic(Arc::clone(&renders)),
        [("a", FieldValue::Int(1)), ("b", FieldValue::Int(2))],
    );
    (sub, renders)
}

// ============================================================================
// Memoization and dependency capture
// ============================================================================

#[test]
fn test_renderer_runs_once_until_invalidated() {
    let (mut sub, renders) = arith_submission();

    assert_eq!(sub.get("c").unwrap(), FieldValue::Int(3));
    assert_eq!(sub.get("c").unwrap(), FieldValue::Int(3));
    assert_eq!(sub.get("d").unwrap(), FieldValue::Int(6));
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    sub.invalidate("c");
    assert_eq!(sub.get("c").unwrap(), FieldValue::Int(3));
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reads_are_recorded_as_edges() {
    let (mut sub, _) = arith_submission();
    sub.get("d").unwrap();

    let graph = sub.store().graph();
    let mut c_deps: Vec<&str> = graph.dependencies("c").iter().map(|f| f.as_ref()).collect();
    c_deps.sort();
    assert_eq!(c_deps, vec!["a", "b"]);
    assert!(graph.has_path("d", "a"));
    assert!(graph.dependencies("e").is_empty());
}

#[test]
fn test_set_cascades_to_transitive_dependents_only() {
    let (mut sub, renders) = arith_submission();
    sub.get("d").unwrap();
    sub.get("e").unwrap();

    sub.set("a", FieldValue::Int(10));
    assert!(!sub.store().is_cached("c"));
    assert!(!sub.store().is_cached("d"));
    assert!(sub.store().is_cached("e"));
    assert!(sub.store().is_cached("b"));

    assert_eq!(sub.get("d").unwrap(), FieldValue::Int(24));
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_on_rendered_field_overrides_renderer() {
    let (mut sub, renders) = arith_submission();
    sub.get("d").unwrap();

    sub.set("c", FieldValue::Int(100));
    assert_eq!(sub.get("d").unwrap(), FieldValue::Int(200));

    // the override has no edges of its own; changing `a` leaves it alone
    sub.set("a", FieldValue::Int(5));
    assert_eq!(sub.get("c").unwrap(), FieldValue::Int(100));
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[test]
fn test_undefined_field_names_kind() {
    let (mut sub, _) = arith_submission();
    let err = sub.get("nope").unwrap_err();
    assert_eq!(err.code(), "BITS-001");
    assert!(err.to_string().contains("arith"));
    assert!(err.to_string().contains("'nope'"));
}

#[test]
fn test_render_error_is_retried_after_fix() {
    let kind = KindBuilder::new("strict")
        .render("upper", |s| {
            let Some(name) = s.get("name")?.as_str().map(str::to_uppercase) else {
                anyhow::bail!("name is not text");
            };
            Ok(FieldValue::text(name))
        })
        .build(None);
    let mut sub = Submission::with_literals(kind, [("name", FieldValue::Int(1))]);

    let err = sub.get("upper").unwrap_err();
    assert_eq!(err.code(), "BITS-002");
    assert!(!sub.store().is_cached("upper"));

    sub.set("name", "heat");
    assert_eq!(sub.get("upper").unwrap(), FieldValue::text("HEAT"));
}

#[test]
fn test_self_reference_is_a_resolution_cycle() {
    let kind = KindBuilder::new("loop")
        .render("a", |s| s.get("b").map_err(Into::into))
        .render("b", |s| s.get("a").map_err(Into::into))
        .build(None);
    let mut sub = Submission::new(kind);

    let err = sub.get("a").unwrap_err();
    // the innermost failure surfaces wrapped by each renderer on the way out
    let chain = format!("{:#}", anyhow::Error::from(err));
    assert!(chain.contains("BITS-003"), "{chain}");
    assert!(chain.contains("a → b → a"), "{chain}");
    assert!(sub.store().active_field().is_none());
}

// ============================================================================
// Validation, display and narrowing
// ============================================================================

#[test]
fn test_validate_reports_missing_and_falsy() {
    let kind = KindBuilder::new("form")
        .render("title", |s| s.get("raw_title").map_err(Into::into))
        .render("blank", |_| Ok(FieldValue::text("")))
        .render("ok", |_| Ok(FieldValue::Bool(true)))
        .build(None);
    let mut sub = Submission::new(kind);

    match sub.validate(&["ok", "title", "blank"]) {
        Err(BitsError::InvalidSubmission { fields, details }) => {
            assert_eq!(fields, vec!["title".to_string(), "blank".to_string()]);
            assert!(details.starts_with("Missing field(s) (title, blank)"), "{details}");
            assert!(details.contains("Value of key blank is"), "{details}");
        }
        other => panic!("expected InvalidSubmission, got {other:?}"),
    }

    sub.set("raw_title", "Heat");
    sub.set("blank", "x");
    assert!(sub.validate(&["ok", "title", "blank"]).is_ok());
}

#[test]
fn test_show_fields_uses_default_fields() {
    let kind = KindBuilder::new("card")
        .render("headline", |s| {
            let t = s.get("title")?;
            Ok(FieldValue::text(format!("** {t} **")))
        })
        .default_fields(&["headline"])
        .build(None);
    let mut sub = Submission::with_literals(kind, [("title", "Ronin")]);

    let none: [&str; 0] = [];
    assert_eq!(sub.show_fields(&none).unwrap(), "Field headline:\n\t** Ronin **\n\n");
    assert_eq!(
        sub.show_fields(&["title"]).unwrap(),
        "Field title:\n\tRonin\n\n"
    );
}

#[test]
fn test_narrowing_keeps_resolved_values() {
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&renders);

    let shapes = KindBuilder::new("shapes")
        .render("shape", move |s| {
            counter.fetch_add(1, Ordering::SeqCst);
            let sides = s.get("sides")?.as_int().unwrap_or(0);
            Ok(FieldValue::text(if sides == 3 { "triangle" } else { "other" }))
        })
        .build(None);
    let triangle = KindBuilder::new("triangle")
        .render("label", |s| {
            let shape = s.get("shape")?;
            Ok(FieldValue::text(format!("a {shape}")))
        })
        .build(Some(&*shapes));
    let entry = KindBuilder::new("entry")
        .narrow(move |s| {
            if s.get("shape")?.as_str() == Some("triangle") {
                Ok(Arc::clone(&triangle))
            } else {
                anyhow::bail!("no kind for this shape")
            }
        })
        .build(Some(&*shapes));

    let mut sub = Submission::with_literals(entry, [("sides", FieldValue::Int(3))]);
    let text = sub.resolve_narrowing(&["label"]).unwrap();

    assert_eq!(sub.kind().name(), "triangle");
    assert_eq!(text, "Field label:\n\ta triangle\n\n");
    // `shape` was resolved while narrowing and reused afterwards
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[test]
fn test_narrowing_without_rule_reraises_invalid_submission() {
    let kind = KindBuilder::new("flat").build(None);
    let mut sub = Submission::new(kind);

    let err = sub.resolve_narrowing(&["missing"]).unwrap_err();
    assert_eq!(err.code(), "BITS-010");
    assert_eq!(sub.kind().name(), "flat");
}

// ============================================================================
// Finalization
// ============================================================================

fn upload_kind(calls: Arc<AtomicUsize>) -> Arc<SubmissionKind> {
    KindBuilder::new("upload")
        .deferred(
            "link",
            |s| {
                let name = s.get("name")?;
                Ok(FieldValue::text(format!("pending:{name}")))
            },
            move |_, placeholder| {
                calls.fetch_add(1, Ordering::SeqCst);
                let name = placeholder.to_string().replace("pending:", "");
                Ok(FieldValue::text(format!("https://img.example/{name}")))
            },
        )
        .render("body", |s| {
            let link = s.get("link")?;
            Ok(FieldValue::text(format!("[img]{link}[/img]")))
        })
        .output("body", "desc", OutputType::Text)
        .build(None)
}

#[test]
fn test_finalize_replaces_placeholder_and_refreshes_dependents() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sub = Submission::with_literals(upload_kind(Arc::clone(&calls)), [("name", "a.png")]);

    assert_eq!(sub.get("body").unwrap(), FieldValue::text("[img]pending:a.png[/img]"));
    assert!(sub.needs_finalization());

    let committed = sub.finalize().unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(&*committed[0], "link");
    assert!(!sub.needs_finalization());
    assert!(!sub.store().is_cached("body"));

    let payload = sub.payload().unwrap();
    assert_eq!(payload.data["desc"], "[img]https://img.example/a.png[/img]");

    // nothing pending, no second side effect
    assert!(sub.finalize().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_finalize_without_resolved_placeholders_does_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sub = Submission::with_literals(upload_kind(Arc::clone(&calls)), [("name", "a.png")]);

    assert!(sub.finalize().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_finalize_failure_is_wrapped() {
    let kind = KindBuilder::new("flaky")
        .deferred(
            "upload",
            |_| Ok(FieldValue::text("placeholder")),
            |_, _| anyhow::bail!("host unreachable"),
        )
        .build(None);
    let mut sub = Submission::new(kind);
    sub.get("upload").unwrap();

    let err = sub.finalize().unwrap_err();
    assert_eq!(err.code(), "BITS-021");
    assert!(err.to_string().contains("host unreachable"));
    // still pending, still a placeholder
    assert!(sub.needs_finalization());
    assert_eq!(sub.get("upload").unwrap(), FieldValue::text("placeholder"));
}

// ============================================================================
// Payload
// ============================================================================

#[test]
fn test_payload_shape() {
    let dir = TempDir::new().unwrap();
    let torrent = dir.path().join("heat.torrent");
    fs::write(&torrent, b"d4:infoe").unwrap();

    let kind = KindBuilder::new("tracker")
        .render("form_title", |s| {
            let t = s.get("title")?;
            Ok(FieldValue::text(format!("{t} (1995)")))
        })
        .output("form_title", "title", OutputType::Text)
        .output("scene", "scene", OutputType::Checkbox)
        .output("proper", "proper", OutputType::Checkbox)
        .output("torrentfile", "file_input", OutputType::File)
        .output_with(
            "shots",
            OutputKey::generated(|i, _| format!("screenshot{}", i + 1)),
            OutputType::Text,
        )
        .build(None);

    let mut sub = Submission::with_literals(
        kind,
        [
            ("title", FieldValue::text("Heat")),
            ("scene", FieldValue::Bool(true)),
            ("proper", FieldValue::Bool(false)),
            ("torrentfile", FieldValue::Path(torrent.clone())),
            ("shots", FieldValue::text_list(["u1", "u2"])),
            ("unmapped", FieldValue::text("ignored")),
        ],
    );

    let payload = sub.payload().unwrap();
    let keys: Vec<&str> = payload.data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["scene", "screenshot1", "screenshot2", "title"]);
    assert_eq!(payload.data["title"], "Heat (1995)");
    assert_eq!(payload.data["scene"], "on");
    assert_eq!(payload.data["screenshot2"], "u2");

    let file = &payload.files["file_input"];
    assert_eq!(file.filename, "heat.torrent");
    assert_eq!(file.bytes, b"d4:infoe".to_vec());
    assert_eq!(file.content_type, "application/octet-stream");
}

#[test]
fn test_payload_propagates_missing_mapped_field() {
    let kind = KindBuilder::new("tracker")
        .output("form_title", "title", OutputType::Text)
        .build(None);
    let mut sub = Submission::new(kind);

    let err = sub.payload().unwrap_err();
    assert_eq!(err.code(), "BITS-001");
}
