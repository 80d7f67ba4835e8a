//! TV specifier parsing
//!
//! Title arguments are checked first (`"Show S01"`, `"Show Season 4"`,
//! `"Show S02E03"`, `"Show 4x12"`). Otherwise the release file name is
//! searched for `SxxEyy`, `NxM` or `Sxx` markers.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::field::FieldValue;

// ============================================================================
// LAZY REGEX PATTERNS (compiled once)
// ============================================================================

/// "Show S02", "Show S02E03", "Show S02x03"
static TITLE_S_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<title>.+) s(?P<season>[0-9]{2,})(?:[ex](?P<episode>[0-9]+))?$").unwrap()
});

/// "Show 4x12"
static TITLE_X_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<title>.+) (?P<season>[0-9]+)x(?P<episode>[0-9]+)$").unwrap());

/// "Show Season 4"
static TITLE_SEASON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<title>.+) season (?P<season>[0-9]+)$").unwrap());

/// "some.series.s02e11.avi", "A.Series.S10.BluRay"
static FILE_S_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[ ._-]+s(?P<season>[0-9]{1,2})(?:e(?P<episode>[0-9]{1,3}))?(?:[ ._-]|$)")
        .unwrap()
});

/// "different.format.4x12.WEB-DL.mkv"
static FILE_X_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<title>.*?)[ ._-]+(?P<season>[0-9]{1,2})x(?P<episode>[0-9]{1,3})(?:[ ._-]|$)")
        .unwrap()
});

/// Series title, season and optional episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvSpecifier {
    pub title: String,
    pub season: u32,
    pub episode: Option<u32>,
}

impl TvSpecifier {
    pub fn new(title: impl Into<String>, season: u32, episode: Option<u32>) -> Self {
        Self {
            title: title.into(),
            season,
            episode,
        }
    }

    /// Record form stored in the `tv_specifier` field
    pub fn to_field(&self) -> FieldValue {
        let mut record = std::collections::BTreeMap::new();
        record.insert("title".to_string(), FieldValue::text(&self.title));
        record.insert("season".to_string(), FieldValue::Int(i64::from(self.season)));
        record.insert(
            "episode".to_string(),
            self.episode.map_or(FieldValue::Null, |e| FieldValue::Int(i64::from(e))),
        );
        FieldValue::Record(record)
    }

    /// Inverse of [`to_field`](Self::to_field)
    pub fn from_field(value: &FieldValue) -> Option<Self> {
        let title = value.key("title")?.as_str()?.to_string();
        let season = u32::try_from(value.key("season")?.as_int()?).ok()?;
        let episode = value
            .key("episode")
            .and_then(FieldValue::as_int)
            .and_then(|e| u32::try_from(e).ok());
        Some(Self {
            title,
            season,
            episode,
        })
    }
}

impl fmt::Display for TvSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episode {
            Some(e) => write!(f, "{} S{:02}E{:02}", self.title, self.season, e),
            None => write!(f, "{} S{:02}", self.title, self.season),
        }
    }
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn from_captures(caps: &Captures<'_>, title: String) -> Option<TvSpecifier> {
    Some(TvSpecifier {
        title,
        season: number(caps, "season")?,
        episode: number(caps, "episode"),
    })
}

/// Parse a title argument alone (`"Firefly S02"`, `"Ramen Brothers Season 4"`)
pub fn parse_title(title: &str) -> Option<TvSpecifier> {
    let title = title.trim();
    [&*TITLE_S_PATTERN, &*TITLE_X_PATTERN, &*TITLE_SEASON_PATTERN]
        .iter()
        .find_map(|re| {
            let caps = re.captures(title)?;
            let name = caps.name("title")?.as_str().trim().to_string();
            from_captures(&caps, name)
        })
}

/// Parse a release file name; the title has its separators replaced by spaces
pub fn parse_release_name(name: &str) -> Option<TvSpecifier> {
    [&*FILE_S_PATTERN, &*FILE_X_PATTERN].iter().find_map(|re| {
        let caps = re.captures(name)?;
        let title = caps
            .name("title")?
            .as_str()
            .replace(['.', '_'], " ")
            .trim()
            .to_string();
        from_captures(&caps, title)
    })
}

/// Determine the TV specifier of a submission.
///
/// A title argument that carries its own season wins. Otherwise the file
/// name of `path` is parsed, keeping the title argument (when given) as the
/// series title.
pub fn parse_tv_specifier(title_arg: Option<&str>, path: Option<&Path>) -> Option<TvSpecifier> {
    let title_arg = title_arg.map(str::trim).filter(|t| !t.is_empty());

    if let Some(spec) = title_arg.and_then(parse_title) {
        return Some(spec);
    }

    let name = path?.file_name()?.to_string_lossy();
    let mut spec = parse_release_name(&name)?;
    if let Some(title) = title_arg {
        spec.title = title.to_string();
    }
    Some(spec)
}
