//! Utilities Module - release-name helpers used by the local kinds
//!
//! - `tags`: tag normalisation (`"Science Fiction"` → `science.fiction`)
//! - `tv`: TV specifier parsing from title arguments and file names
//! - `release`: source/resolution/year/proper markers and container

pub mod release;
mod tags;
mod tv;

pub use tags::{format_tag, format_tags};
pub use tv::{parse_release_name, parse_tv_specifier, parse_title, TvSpecifier};
