//! video kind - release-name markers, tags and TV/movie narrowing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail};
use walkdir::WalkDir;

use crate::field::FieldValue;
use crate::registry::{OutputType, SubmissionKind};
use crate::store::FieldStore;
use crate::util::{self, release, TvSpecifier};

use super::{list_field, optional, optional_text, path_field, publish_images, release_name, MOVIE, TV};

/// Cast members turned into tags when `num_cast` is not supplied
const DEFAULT_NUM_CAST: i64 = 5;

pub(super) fn kind(parent: &SubmissionKind) -> Arc<SubmissionKind> {
    SubmissionKind::builder("video")
        .render("tv_specifier", |s| {
            let title_arg = optional_text(s, "title_arg")?;
            let path = s.get_opt("path")?.and_then(|p| p.as_path().map(Path::to_path_buf));
            Ok(util::parse_tv_specifier(title_arg.as_deref(), path.as_deref())
                .map_or(FieldValue::Null, |spec| spec.to_field()))
        })
        .render("category", |s| {
            let category = if s.get("tv_specifier")?.is_truthy() {
                "tv"
            } else {
                "movie"
            };
            Ok(FieldValue::text(category))
        })
        .render("search_title", |s| {
            if let Some(spec) = TvSpecifier::from_field(&s.get("tv_specifier")?) {
                return Ok(FieldValue::text(spec.title));
            }
            if let Some(title) = optional_text(s, "title_arg")? {
                return Ok(FieldValue::text(title));
            }
            let name = release_name(s)?;
            release::title(&name)
                .map(FieldValue::text)
                .ok_or_else(|| anyhow!("no title in release name '{}'", name))
        })
        .render("title", |s| s.get("search_title").map_err(Into::into))
        .render("source", |s| {
            let name = release_name(s)?;
            release::source(&name)
                .map(FieldValue::text)
                .ok_or_else(|| anyhow!("unknown source in '{}'; pass -u source BluRay|WEB-DL|WebRip|HDTV", name))
        })
        .render("resolution", |s| {
            let name = release_name(s)?;
            release::resolution(&name)
                .map(FieldValue::text)
                .ok_or_else(|| anyhow!("unknown resolution in '{}'; pass -u resolution 1080p|720p|...", name))
        })
        .render("mediainfo_path", |s| {
            let path = path_field(s, "path")?;
            Ok(FieldValue::Path(media_file(&path)?))
        })
        .render("container", |s| {
            let media = path_field(s, "mediainfo_path")?;
            release::container(&media)
                .map(FieldValue::text)
                .ok_or_else(|| anyhow!("unknown or unsupported container: {}", media.display()))
        })
        .render("year", |s| {
            let name = release_name(s)?;
            release::year(&name)
                .map(|y| FieldValue::Int(i64::from(y)))
                .ok_or_else(|| anyhow!("no year in '{}'; pass -u year YYYY", name))
        })
        .render("additional", |s| {
            let mut additional = Vec::new();
            let name = release_name(s)?;
            if release::is_proper(&name) && s.get("scene")?.is_truthy() {
                additional.push(FieldValue::text("PROPER"));
            }
            if let Some(edition) = optional_text(s, "edition")? {
                additional.push(FieldValue::text(edition));
            }
            Ok(FieldValue::List(additional))
        })
        .render("form_release_info", |s| {
            let additional = s.get("additional")?;
            let parts: Vec<String> = additional
                .as_list()
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(FieldValue::text(parts.join(" / ")))
        })
        .render("tags", |s| {
            let limit = optional(s, "num_cast")?
                .and_then(|n| n.as_int())
                .unwrap_or(DEFAULT_NUM_CAST);
            let limit = usize::try_from(limit).unwrap_or(0);

            let mut tags: Vec<String> = list_field(s, "genres")?.iter().map(ToString::to_string).collect();
            tags.extend(
                list_field(s, "cast")?
                    .iter()
                    .take(limit)
                    .map(ToString::to_string),
            );
            Ok(FieldValue::text(util::format_tags(tags)))
        })
        .deferred("cover", cover_placeholder, |s, placeholder| {
            if placeholder.is_null() {
                return Ok(placeholder);
            }
            let mut links = publish_images(s, std::slice::from_ref(&placeholder))?;
            Ok(links.pop().unwrap_or(placeholder))
        })
        .output("tags", "tags", OutputType::Text)
        .output("cover", "image", OutputType::Text)
        .narrow(|s| {
            let kind = if s.get("tv_specifier")?.is_truthy() {
                &TV
            } else {
                &MOVIE
            };
            Ok(Arc::clone(&**kind))
        })
        .build(Some(parent))
}

/// Local cover art from `cover_path`; null when none was given
fn cover_placeholder(store: &mut FieldStore) -> anyhow::Result<FieldValue> {
    let Some(cover) = optional(store, "cover_path")? else {
        return Ok(FieldValue::Null);
    };
    match cover.as_path() {
        Some(path) if path.is_file() => Ok(cover),
        _ => bail!("cover image {} is not a file; pass -u cover_path FILE", cover),
    }
}

/// The release itself, or the largest file inside a release directory
fn media_file(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        bail!("release path {} does not exist", path.display());
    }

    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let len = e.metadata().ok()?.len();
            Some((len, e.into_path()))
        })
        // largest first, then by name
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, p)| p)
        .ok_or_else(|| anyhow!("no files in release directory {}", path.display()))
}
