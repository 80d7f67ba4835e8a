//! Release-name markers
//!
//! Source, resolution, year and proper/repack flags read from a scene-style
//! release path (`Movie.Title.2004.1080p.BluRay.x264-GRP.mkv`).

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Known sources, in lookup order: (needles, marker)
const SOURCES: &[(&[&str], &str)] = &[
    (&["bluray"], "BluRay"),
    (&["web-dl", "webdl"], "WEB-DL"),
    (&["webrip"], "WebRip"),
    (&["hdtv"], "HDTV"),
];

/// Known resolutions, in lookup order
const RESOLUTIONS: &[&str] = &["1080p", "720p", "1080i", "720i", "480p", "480i"];

// a year stands between separators; `1920x1080` is a frame size
static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[ ._(\[-])((?:19|20)[0-9]{2})(?:[ ._)\]-]|$)").unwrap());

static PROPER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[ ._-])(?:proper|repack)(?:[ ._-]|$)").unwrap());

/// Source marker (`BluRay`, `WEB-DL`, `WebRip`, `HDTV`)
pub fn source(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    SOURCES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, marker)| *marker)
}

/// Resolution marker (`1080p`, `720p`, ...)
pub fn resolution(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    RESOLUTIONS.iter().copied().find(|r| lower.contains(r))
}

/// First plausible release year (19xx or 20xx)
pub fn year(name: &str) -> Option<u32> {
    YEAR_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether the release is a PROPER or REPACK
pub fn is_proper(name: &str) -> bool {
    PROPER_PATTERN.is_match(name)
}

/// Title part of a release name: every token before the first marker.
///
/// `Kung.Fu.Hustle.2004.1080p.BluRay` → `Kung Fu Hustle`
pub fn title(name: &str) -> Option<String> {
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if container(Path::new(name)).is_some() && !ext.is_empty() => stem,
        _ => name,
    };

    let mut words = Vec::new();
    for token in stem.split(['.', '_', ' ']).filter(|t| !t.is_empty()) {
        if is_marker(token) {
            break;
        }
        words.push(token);
    }

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn is_marker(token: &str) -> bool {
    let lower = token.to_lowercase();
    (lower.len() == 4 && year(&lower).is_some())
        || RESOLUTIONS.contains(&lower.as_str())
        || SOURCES
            .iter()
            .any(|(needles, _)| needles.iter().any(|n| lower.starts_with(n)))
        || is_proper(&lower)
}

/// Container marker from the media file extension
pub fn container(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "mkv" => Some("MKV"),
        "avi" => Some("AVI"),
        "mp4" | "m4v" => Some("MP4"),
        _ => None,
    }
}
