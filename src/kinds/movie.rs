//! movie kind - release details and screenshots
//!
//! Screenshots are deferred: until finalization they are local paths, and
//! the description embedding them re-renders once they are published.

use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::field::FieldValue;
use crate::registry::{OutputKey, OutputType, SubmissionKind};
use crate::store::FieldStore;

use super::{optional, optional_text, publish_images};

/// Screenshots taken when `num_screenshots` is not supplied
const DEFAULT_NUM_SCREENSHOTS: i64 = 2;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub(super) fn kind(parent: &SubmissionKind) -> Arc<SubmissionKind> {
    SubmissionKind::builder("movie")
        .render("category", |_| Ok(FieldValue::text("movie")))
        .render("form_type", |_| Ok(FieldValue::text("Movies")))
        .render("form_title", |s| s.get("title").map_err(Into::into))
        .deferred("screenshots", screenshots, |s, placeholder| {
            let images = placeholder.as_list().unwrap_or_default();
            Ok(FieldValue::List(publish_images(s, images)?))
        })
        .render("form_description", form_description)
        .output("form_title", "title", OutputType::Text)
        .output("source", "source", OutputType::Text)
        .output("container", "container", OutputType::Text)
        .output("resolution", "resolution", OutputType::Text)
        .output("form_release_info", "remaster_title", OutputType::Text)
        .output("year", "year", OutputType::Text)
        .output("form_description", "desc", OutputType::Text)
        .output_with(
            "screenshots",
            OutputKey::generated(|i, _| format!("screenshot{}", i + 1)),
            OutputType::Text,
        )
        .default_fields(&["form_title", "tags", "year"])
        .build(Some(parent))
}

/// Images from `screenshot_dir`, sorted by name, at most `num_screenshots`
fn screenshots(store: &mut FieldStore) -> anyhow::Result<FieldValue> {
    let Some(dir) = optional(store, "screenshot_dir")? else {
        return Ok(FieldValue::List(Vec::new()));
    };
    let Some(dir) = dir.as_path() else {
        anyhow::bail!("screenshot_dir is not a path: {:?}", dir);
    };

    let limit = optional(store, "num_screenshots")?
        .and_then(|n| n.as_int())
        .unwrap_or(DEFAULT_NUM_SCREENSHOTS);
    let limit = usize::try_from(limit).unwrap_or(0);

    let mut images: Vec<_> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image(e.path()))
        .map(|e| e.into_path())
        .collect();
    images.sort();
    images.truncate(limit);

    Ok(FieldValue::List(images.into_iter().map(FieldValue::Path).collect()))
}

/// `description` followed by one `[img]` tag per screenshot
fn form_description(store: &mut FieldStore) -> anyhow::Result<FieldValue> {
    let mut lines: Vec<String> = optional_text(store, "description")?.into_iter().collect();
    let screenshots = store.get("screenshots")?;
    for shot in screenshots.as_list().unwrap_or_default() {
        lines.push(format!("[img]{}[/img]", shot));
    }
    Ok(FieldValue::text(lines.join("\n")))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| IMAGE_EXTENSIONS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}
