//! Supernote extraction.
//!
//! Supernotes are margin annotations keyed by paragraph number. A record's
//! `supernotes` object maps number strings to note sets:
//!
//! ```text
//! "supernotes": {
//!   "12": { "commentary": ["..."], "image": [{ "url-format": "...", ... }] },
//!   "3":  { "link": [{ "label": "...", "url": "..." }] }
//! }
//! ```
//!
//! Paragraphs are ordered numerically (`3` before `12`) and the sets within a
//! paragraph always appear in the order commentary, citation, image, map,
//! link, video, whatever order the source object lists them in. The result is
//! written as `supernotes.json`:
//!
//! ```text
//! [
//!   { "paragraph": 3, "notes": [ { "type": "link", "notes": [...] } ] },
//!   ...
//! ]
//! ```
//!
//! Note text is passed through as authored; the site's annotation script
//! renders it. Map and video numbers are written as strings, which is what
//! that script reads.

use crate::load::ContentRecord;
use crate::types::{
    ImageSize, MissingWildcard, UrlTemplate, as_display_string, lenient_text, lenient_u32,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SupernoteError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("supernote key {0:?} is not a paragraph number")]
    NonNumericKey(String),
    #[error("supernotes for paragraph {0} are listed twice")]
    DuplicateParagraph(u32),
    #[error("supernotes for paragraph {0} are not an object")]
    NotAnObject(u32),
    #[error("paragraph {paragraph} {kind} notes: {source}")]
    NoteSet {
        paragraph: u32,
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("paragraph {paragraph} image notes: {source}")]
    ImageTemplate {
        paragraph: u32,
        #[source]
        source: MissingWildcard,
    },
}

/// Note-set keys in output order.
const NOTE_SET_ORDER: [&str; 6] = ["commentary", "citation", "image", "map", "link", "video"];

// =============================================================================
// Note types
// =============================================================================

/// One group of notes of a single kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "notes", rename_all = "lowercase")]
pub enum NoteSet {
    Commentary(Vec<String>),
    Citation(Vec<String>),
    Image(Vec<NoteImage>),
    Map(Vec<NoteMap>),
    Link(Vec<NoteLink>),
    Video(Vec<NoteVideo>),
}

impl NoteSet {
    fn from_value(kind: &'static str, paragraph: u32, value: Value) -> Result<Self, SupernoteError> {
        let schema = |source| SupernoteError::NoteSet {
            paragraph,
            kind,
            source,
        };
        let set = match kind {
            "commentary" => NoteSet::Commentary(serde_json::from_value(value).map_err(schema)?),
            "citation" => NoteSet::Citation(serde_json::from_value(value).map_err(schema)?),
            "image" => {
                let wire: Vec<WireNoteImage> = serde_json::from_value(value).map_err(schema)?;
                let images = wire
                    .into_iter()
                    .map(NoteImage::from_wire)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|source| SupernoteError::ImageTemplate { paragraph, source })?;
                NoteSet::Image(images)
            }
            "map" => NoteSet::Map(serde_json::from_value(value).map_err(schema)?),
            "link" => NoteSet::Link(serde_json::from_value(value).map_err(schema)?),
            _ => NoteSet::Video(serde_json::from_value(value).map_err(schema)?),
        };
        Ok(set)
    }
}

/// An image note. `url` is the file-name template, like inline images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteImage {
    pub url: UrlTemplate,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub credit: Option<String>,
    /// Full `url-format` as authored, used for the CDN listing.
    #[serde(skip)]
    pub url_format: String,
}

impl NoteImage {
    fn from_wire(wire: WireNoteImage) -> Result<Self, MissingWildcard> {
        Ok(Self {
            url: UrlTemplate::from_url_format(&wire.url_format)?,
            alt: wire.alt,
            caption: wire.caption,
            credit: wire.credit,
            url_format: wire.url_format,
        })
    }

    /// CDN URL of one size variant: `{cdn_base}{url-format with size}`.
    pub fn cdn_url(&self, cdn_base: &str, size: ImageSize) -> String {
        format!(
            "{}{}",
            cdn_base,
            self.url_format.replace(UrlTemplate::WILDCARD, size.keyword())
        )
    }
}

#[derive(Deserialize)]
struct WireNoteImage {
    #[serde(rename = "url-format")]
    url_format: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    credit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteCoordinate {
    #[serde(deserialize_with = "lenient_text")]
    pub longitude: String,
    #[serde(deserialize_with = "lenient_text")]
    pub latitude: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteMarker {
    pub position: NoteCoordinate,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMap {
    #[serde(deserialize_with = "lenient_text")]
    pub tileset: String,
    pub center: NoteCoordinate,
    #[serde(deserialize_with = "lenient_u32", serialize_with = "as_display_string")]
    pub zoom: u32,
    #[serde(
        alias = "min-zoom",
        deserialize_with = "lenient_u32",
        serialize_with = "as_display_string"
    )]
    pub min_zoom: u32,
    #[serde(
        alias = "max-zoom",
        deserialize_with = "lenient_u32",
        serialize_with = "as_display_string"
    )]
    pub max_zoom: u32,
    #[serde(default)]
    pub markers: Vec<NoteMarker>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteVideo {
    pub service: String,
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(deserialize_with = "lenient_u32", serialize_with = "as_display_string")]
    pub width: u32,
    #[serde(deserialize_with = "lenient_u32", serialize_with = "as_display_string")]
    pub height: u32,
    #[serde(default)]
    pub caption: Option<String>,
}

// =============================================================================
// Collection
// =============================================================================

/// The notes attached to one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphNotes {
    pub paragraph: u32,
    pub notes: Vec<NoteSet>,
}

/// Every paragraph's notes, in paragraph order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SupernoteCollection {
    pub paragraphs: Vec<ParagraphNotes>,
}

impl SupernoteCollection {
    /// Build the collection for a record. `None` when the record carries no
    /// `supernotes` object at all.
    pub fn from_record(record: &ContentRecord) -> Result<Option<Self>, SupernoteError> {
        let Some(notes) = &record.supernotes else {
            return Ok(None);
        };
        let collection = Self::from_notes(notes)?;
        debug!(
            article = %record.metadata.short_reference,
            paragraphs = collection.paragraphs.len(),
            "supernotes collected"
        );
        Ok(Some(collection))
    }

    pub fn from_notes(notes: &Map<String, Value>) -> Result<Self, SupernoteError> {
        let mut by_number: BTreeMap<u32, &Map<String, Value>> = BTreeMap::new();
        for (key, value) in notes {
            let number: u32 = key
                .trim()
                .parse()
                .map_err(|_| SupernoteError::NonNumericKey(key.clone()))?;
            let sets = value
                .as_object()
                .ok_or(SupernoteError::NotAnObject(number))?;
            if by_number.insert(number, sets).is_some() {
                return Err(SupernoteError::DuplicateParagraph(number));
            }
        }

        let paragraphs = by_number
            .into_iter()
            .map(|(number, sets)| -> Result<ParagraphNotes, SupernoteError> {
                for key in sets.keys() {
                    if !NOTE_SET_ORDER.contains(&key.as_str()) {
                        warn!(paragraph = number, key = %key, "ignoring unknown supernote set");
                    }
                }
                let notes = NOTE_SET_ORDER
                    .iter()
                    .filter_map(|kind| sets.get(*kind).map(|value| (*kind, value)))
                    .map(|(kind, value)| NoteSet::from_value(kind, number, value.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ParagraphNotes {
                    paragraph: number,
                    notes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { paragraphs })
    }

    /// `supernotes.json` contents.
    pub fn to_json(&self) -> Result<String, SupernoteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// CDN URLs of every image note, in paragraph order.
    ///
    /// Each image yields its medium and large variants. Thumbnails are only
    /// published for paragraphs with more than one image, where the site
    /// shows a strip to pick from.
    pub fn image_urls(&self, cdn_base: &str) -> Vec<String> {
        let mut urls = Vec::new();
        for paragraph in &self.paragraphs {
            for set in &paragraph.notes {
                let NoteSet::Image(images) = set else {
                    continue;
                };
                let with_thumbnail = images.len() > 1;
                for image in images {
                    urls.push(image.cdn_url(cdn_base, ImageSize::Medium));
                    urls.push(image.cdn_url(cdn_base, ImageSize::Large));
                    if with_thumbnail {
                        urls.push(image.cdn_url(cdn_base, ImageSize::Thumbnail));
                    }
                }
            }
        }
        urls
    }
}
