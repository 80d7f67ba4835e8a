//! Bitsmith - lazy field engine for tracker submissions (v0.1)
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  field/     FieldValue (truthiness, text form)               │
//! │  registry/  Output mapping + renderer tables (SubmissionKind)│
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ENGINE                               │
//! │  store/     Lazy memoizing resolver (FieldStore)             │
//! │  dag/       Dependency edges, invalidation, finalize order   │
//! │  submission/ Validation, narrowing, finalization             │
//! │  payload/   {data, files} document builder                   │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     LOCAL SUBMISSIONS                        │
//! │  kinds/     base → video → tv | movie                        │
//! │  util/      Tag normalisation, TV specifiers, release markers│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`field`] | `FieldValue` data model |
//! | [`registry`] | `Registry` composition, `SubmissionKind`, `KindBuilder` |
//! | [`store`] | `FieldStore`: memoization, dependency capture, invalidation |
//! | [`dag`] | `DependencyGraph` with FxHashMap/SmallVec edges |
//! | [`submission`] | `Submission`: validate, show, narrow, finalize |
//! | [`payload`] | `Payload` builder and preview |
//! | [`kinds`] | Local-only kinds built on the engine |
//! | [`util`] | Release-name helpers |
//! | [`config`] | `~/.config/bitsmith/config.toml` |
//! | [`error`] | Error types with fix suggestions |
//!
//! ## Example
//!
//! ```
//! use bitsmith::{FieldValue, KindBuilder, OutputType, Submission};
//!
//! let kind = KindBuilder::new("note")
//!     .render("form_title", |s| {
//!         let title = s.get("title")?;
//!         Ok(FieldValue::text(format!("[{title}]")))
//!     })
//!     .output("form_title", "title", OutputType::Text)
//!     .build(None);
//!
//! let mut sub = Submission::with_literals(kind, [("title", "Heat")]);
//! assert_eq!(sub.get("form_title").unwrap(), FieldValue::text("[Heat]"));
//!
//! sub.set("title", "Ronin");
//! let payload = sub.payload().unwrap();
//! assert_eq!(payload.data["title"], "[Ronin]");
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - values and per-kind tables
// ═══════════════════════════════════════════════════════════════
pub mod field;
pub mod registry;

// ═══════════════════════════════════════════════════════════════
// ENGINE - resolution, invalidation, finalization, output
// ═══════════════════════════════════════════════════════════════
pub mod dag;
pub mod payload;
pub mod store;
pub mod submission;

// ═══════════════════════════════════════════════════════════════
// LOCAL SUBMISSIONS - kinds and release-name helpers
// ═══════════════════════════════════════════════════════════════
pub mod kinds;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{BitsError, FixSuggestion, Result};

// Config types
pub use config::BitsConfig;

// Engine types
pub use dag::DependencyGraph;
pub use field::FieldValue;
pub use payload::{FilePart, Payload};
pub use registry::{KindBuilder, OutputKey, OutputType, Registry, SubmissionKind};
pub use store::FieldStore;
pub use submission::Submission;
