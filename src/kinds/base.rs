//! base kind - fields every submission carries

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use crate::field::FieldValue;
use crate::registry::{OutputType, SubmissionKind};
use crate::store::FieldStore;

use super::{optional, path_field, VIDEO};

pub(super) fn kind() -> Arc<SubmissionKind> {
    SubmissionKind::builder("base")
        .render("form_submit", |_| Ok(FieldValue::text("true")))
        .render("category", |_| {
            bail!("a base submission has no category; narrow it to tv or movie")
        })
        .render("form_type", |s| {
            let category = s.get("category")?;
            match category.as_str() {
                Some("tv") => Ok(FieldValue::text("TV")),
                Some("movie") => Ok(FieldValue::text("Movies")),
                _ => bail!("no form type for category {:?}", category),
            }
        })
        .render("scene", |_| Ok(FieldValue::Bool(false)))
        .deferred("torrentfile", torrent_placeholder, torrent_finalize)
        .output("form_submit", "submit", OutputType::Text)
        .output("form_type", "type", OutputType::Text)
        .output("scene", "scene", OutputType::Checkbox)
        .output("torrentfile", "file_input", OutputType::File)
        .default_fields(&["form_title", "tags"])
        .narrow(|_| Ok(Arc::clone(&*VIDEO)))
        .build(None)
}

/// `<path>.torrent` next to the release, which must already exist
fn torrent_placeholder(store: &mut FieldStore) -> anyhow::Result<FieldValue> {
    let path = path_field(store, "path")?;
    let mut name = OsString::from(path.as_os_str());
    name.push(".torrent");
    let torrent = PathBuf::from(name);

    if !torrent.is_file() {
        bail!(
            "no torrent file at {}; create it first or pass -u torrentfile PATH",
            torrent.display()
        );
    }
    Ok(FieldValue::Path(torrent))
}

/// Copy the torrent into the configured black hole (once)
fn torrent_finalize(store: &mut FieldStore, placeholder: FieldValue) -> anyhow::Result<FieldValue> {
    let Some(black_hole) = optional(store, "black_hole")? else {
        return Ok(placeholder);
    };
    let (Some(dir), Some(torrent)) = (black_hole.as_path(), placeholder.as_path()) else {
        bail!("cannot copy {:?} into black hole {:?}", placeholder, black_hole);
    };
    let Some(file_name) = torrent.file_name() else {
        bail!("torrent path {} has no file name", torrent.display());
    };

    let target = dir.join(file_name);
    if target.exists() {
        info!(target = %target.display(), "torrent already in black hole");
    } else {
        fs::copy(torrent, &target).with_context(|| {
            format!("copying {} to {}", torrent.display(), target.display())
        })?;
        info!(target = %target.display(), "torrent copied to black hole");
    }
    Ok(placeholder)
}
