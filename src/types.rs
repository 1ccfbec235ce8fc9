//! Shared types threaded through loading, rendering and extraction.
//!
//! [`ArticleContext`] carries the issue identifiers every URL is built from.
//! [`UrlTemplate`] is the validated file-name pattern of an image, with a
//! `***` placeholder that [`ImageSize`] keywords are substituted into.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Issue identifiers for the article being rendered.
///
/// Built once per article from the command line and passed by reference into
/// every renderer. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContext {
    pub volume: String,
    pub number: String,
}

impl ArticleContext {
    pub fn new(volume: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            volume: volume.into(),
            number: number.into(),
        }
    }

    /// Site-relative URL of an image variant:
    /// `{base}/{volume}/{number}/{template with size}`.
    pub fn image_url(&self, base: &str, template: &UrlTemplate, size: ImageSize) -> String {
        format!(
            "{}/{}/{}/{}",
            base.trim_end_matches('/'),
            self.volume,
            self.number,
            template.with_size(size)
        )
    }
}

/// Size variants published for every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Medium,
    Large,
    /// Gallery thumbnail on the web site.
    Thumb,
    /// Thumbnail name used by the image CDN.
    Thumbnail,
}

impl ImageSize {
    pub fn keyword(self) -> &'static str {
        match self {
            ImageSize::Medium => "medium",
            ImageSize::Large => "large",
            ImageSize::Thumb => "thumb",
            ImageSize::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("url-format {0:?} has no `***` size placeholder in its file name")]
pub struct MissingWildcard(pub String);

/// File-name portion of an image `url-format`.
///
/// `http://host/path/***-name.jpg` becomes `***-name.jpg`. The placeholder is
/// required; a template without one would silently publish the same file for
/// every size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub const WILDCARD: &'static str = "***";

    pub fn from_url_format(url_format: &str) -> Result<Self, MissingWildcard> {
        let file_name = url_format.rsplit('/').next().unwrap_or(url_format);
        if !file_name.contains(Self::WILDCARD) {
            return Err(MissingWildcard(url_format.to_string()));
        }
        Ok(Self(file_name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn with_size(&self, size: ImageSize) -> String {
        self.0.replace(Self::WILDCARD, size.keyword())
    }
}

impl Serialize for UrlTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coordinate {
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,
}

// =============================================================================
// Lenient scalar fields
// =============================================================================
//
// Content records were produced by several editing tools over the years, and
// numeric fields show up both as JSON numbers and as numeric strings.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn into_text(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }
    }
}

pub(crate) fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    text.trim()
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("expected an integer, found {text:?}")))
}

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a finite number, found {text:?}")))
}

/// Accepts a number or a string and keeps its textual form.
pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(NumberOrString::deserialize(deserializer)?.into_text())
}

pub(crate) fn lenient_text_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_text))
}

/// Serializes any displayable value as a JSON string.
///
/// Supernote consumers read map and video numbers as strings.
pub(crate) fn as_display_string<T: fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
