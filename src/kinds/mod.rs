//! Kinds Module - local-only submission kinds
//!
//! ```text
//! base ──► video ──┬──► tv
//!                  └──► movie
//! ```
//!
//! Every renderer here works from local data only: the release path, the
//! title argument and literal fields supplied by the host (`genres`, `cast`,
//! `description`, `screenshot_dir`, `cover_path`, ...). Kinds are composed
//! once and shared through process-wide statics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::{BitsError, Result};
use crate::field::FieldValue;
use crate::registry::SubmissionKind;
use crate::store::FieldStore;

mod base;
mod movie;
mod tv;
mod video;

/// Root kind: submit flag, form type, scene flag and the torrent file
pub static BASE: Lazy<Arc<SubmissionKind>> = Lazy::new(base::kind);

/// Release-name markers and tags shared by TV and movie submissions
pub static VIDEO: Lazy<Arc<SubmissionKind>> = Lazy::new(|| video::kind(&BASE));

pub static TV: Lazy<Arc<SubmissionKind>> = Lazy::new(|| tv::kind(&VIDEO));

pub static MOVIE: Lazy<Arc<SubmissionKind>> = Lazy::new(|| movie::kind(&VIDEO));

/// Kind names accepted by [`by_name`]
pub const KIND_NAMES: &[&str] = &["base", "video", "tv", "movie"];

/// Look up a composed kind by name
pub fn by_name(name: &str) -> Result<Arc<SubmissionKind>> {
    let kind = match name.to_lowercase().as_str() {
        "base" => &BASE,
        "video" => &VIDEO,
        "tv" => &TV,
        "movie" => &MOVIE,
        _ => {
            return Err(BitsError::UnknownKind {
                name: name.to_string(),
            })
        }
    };
    Ok(Arc::clone(&**kind))
}

// ============================================================================
// RENDERER HELPERS
// ============================================================================

/// Read `field` as a filesystem path
pub(crate) fn path_field(store: &mut FieldStore, field: &str) -> anyhow::Result<PathBuf> {
    let value = store.get(field)?;
    value
        .as_path()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("field '{}' does not hold a path ({:?})", field, value))
}

/// Read an optional literal; absent, null and empty values are `None`
pub(crate) fn optional(store: &mut FieldStore, field: &str) -> anyhow::Result<Option<FieldValue>> {
    Ok(store.get_opt(field)?.filter(FieldValue::is_truthy))
}

/// Read an optional literal as text
pub(crate) fn optional_text(store: &mut FieldStore, field: &str) -> anyhow::Result<Option<String>> {
    Ok(optional(store, field)?.map(|v| v.to_string()))
}

/// Read a literal as a list (a scalar counts as one element)
pub(crate) fn list_field(store: &mut FieldStore, field: &str) -> anyhow::Result<Vec<FieldValue>> {
    Ok(match optional(store, field)? {
        Some(FieldValue::List(items)) => items,
        Some(single) => vec![single],
        None => Vec::new(),
    })
}

/// File name of the release path (the directory name for folder releases)
pub(crate) fn release_name(store: &mut FieldStore) -> anyhow::Result<String> {
    let path = path_field(store, "path")?;
    Ok(path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string()))
}

/// Copy images into `image_dir` and return their `file://` links.
///
/// Without an `image_dir` the local paths are returned unchanged. Images
/// already present in the directory are not copied again.
pub(crate) fn publish_images(store: &mut FieldStore, images: &[FieldValue]) -> anyhow::Result<Vec<FieldValue>> {
    let Some(dir) = optional(store, "image_dir")? else {
        return Ok(images.to_vec());
    };
    let Some(dir) = dir.as_path() else {
        bail!("image_dir is not a path: {:?}", dir);
    };
    fs::create_dir_all(dir).with_context(|| format!("creating image directory {}", dir.display()))?;

    let mut links = Vec::with_capacity(images.len());
    for image in images {
        let Some(source) = image.as_path() else {
            bail!("cannot publish {:?}: not a path", image);
        };
        let Some(file_name) = source.file_name() else {
            bail!("image path {} has no file name", source.display());
        };

        let target = dir.join(file_name);
        if target.exists() {
            info!(target = %target.display(), "image already published");
        } else {
            fs::copy(source, &target)
                .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
            info!(target = %target.display(), "image published");
        }
        links.push(FieldValue::text(format!("file://{}", target.display())));
    }
    Ok(links)
}
