//! tv kind - episode and season titles

use std::sync::Arc;

use anyhow::anyhow;

use crate::field::FieldValue;
use crate::registry::{OutputType, SubmissionKind};
use crate::store::FieldStore;
use crate::util::TvSpecifier;

pub(super) fn kind(parent: &SubmissionKind) -> Arc<SubmissionKind> {
    SubmissionKind::builder("tv")
        .render("category", |_| Ok(FieldValue::text("tv")))
        .render("form_type", |_| Ok(FieldValue::text("TV")))
        .render("form_title", form_title)
        .render("form_description", |s| {
            let description = s.get("description")?;
            Ok(FieldValue::text(description.to_string()))
        })
        .output("form_title", "title", OutputType::Text)
        .output("form_description", "desc", OutputType::Text)
        .default_fields(&["form_title", "tags", "form_description"])
        .build(Some(parent))
}

/// `{title} S01E02 [markers]` or `{title} - Season 1 [markers]`
fn form_title(store: &mut FieldStore) -> anyhow::Result<FieldValue> {
    let spec = TvSpecifier::from_field(&store.get("tv_specifier")?)
        .ok_or_else(|| anyhow!("release has no season or episode marker"))?;
    let title = store.get("title")?;

    let mut markers = Vec::new();
    for field in ["source", "container", "resolution"] {
        markers.push(store.get(field)?.to_string());
    }
    if let Some(additional) = store.get("additional")?.as_list() {
        markers.extend(additional.iter().map(ToString::to_string));
    }
    let markers = markers.join(" / ");

    let text = match spec.episode {
        Some(episode) => format!("{} S{:02}E{:02} [{}]", title, spec.season, episode, markers),
        None => format!("{} - Season {} [{}]", title, spec.season, markers),
    };
    Ok(FieldValue::text(text))
}
