//! Content elements of an article and their construction from JSON.
//!
//! Each element of a record's `content` array carries a `type` tag. The tag
//! is resolved to an [`ElementKind`] first; the rest of the object is then
//! deserialized into a wire struct and validated into the element type the
//! renderers consume. All Markdown fields are rendered here, so a malformed
//! caption or a wildcard-less `url-format` fails while loading, before any
//! output is produced.

use crate::config::RenderConfig;
use crate::inline::{self, InlineError};
use crate::types::{
    Coordinate, MissingWildcard, UrlTemplate, lenient_text, lenient_u32,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ElementError {
    #[error("{0}")]
    Schema(#[from] serde_json::Error),
    #[error("{0}")]
    UrlTemplate(#[from] MissingWildcard),
    #[error("{0}")]
    Inline(#[from] InlineError),
    #[error("audio url {url:?} does not start with {prefix:?}")]
    AudioSource { url: String, prefix: String },
    #[error("map zoom {zoom} is outside minZoom {min} / maxZoom {max}")]
    ZoomRange { zoom: u32, min: u32, max: u32 },
}

// =============================================================================
// Element kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Plain,
    EditorialIntro,
    AltVoice,
    StageDirection,
    Blockquote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLevel {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerWeight {
    Major,
    Minor,
}

/// The closed set of element types the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph(ParagraphStyle),
    Image,
    Gallery,
    Header(HeaderLevel),
    Divider(DividerWeight),
    Table,
    Audio,
    Video,
    Map,
}

impl ElementKind {
    /// Resolve a JSON `type` tag. Returns `None` for tags outside the set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "paragraph" => ElementKind::Paragraph(ParagraphStyle::Plain),
            "editorial-intro-paragraph" => ElementKind::Paragraph(ParagraphStyle::EditorialIntro),
            "alt-voice-paragraph" => ElementKind::Paragraph(ParagraphStyle::AltVoice),
            "stage-direction-paragraph" => ElementKind::Paragraph(ParagraphStyle::StageDirection),
            "blockquote" => ElementKind::Paragraph(ParagraphStyle::Blockquote),
            "image" => ElementKind::Image,
            "anvil-gallery" => ElementKind::Gallery,
            "major-header" => ElementKind::Header(HeaderLevel::Major),
            "minor-header" => ElementKind::Header(HeaderLevel::Minor),
            "major-divider" => ElementKind::Divider(DividerWeight::Major),
            "minor-divider" => ElementKind::Divider(DividerWeight::Minor),
            "table" => ElementKind::Table,
            "audio" => ElementKind::Audio,
            "video" => ElementKind::Video,
            "map" => ElementKind::Map,
            _ => return None,
        };
        Some(kind)
    }
}

// =============================================================================
// Elements
// =============================================================================

/// One rendered unit of an article body.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentElement {
    Paragraph(Paragraph),
    Image(Image),
    Gallery(ImageGallery),
    Header(Header),
    Divider(DividerWeight),
    Table(Table),
    Audio(Audio),
    Video(Video),
    Map(Map),
}

impl ContentElement {
    /// Build an element of `kind` from its JSON object.
    pub fn build(
        kind: ElementKind,
        value: Value,
        config: &RenderConfig,
    ) -> Result<Self, ElementError> {
        let element = match kind {
            ElementKind::Paragraph(style) => {
                ContentElement::Paragraph(Paragraph::from_wire(style, serde_json::from_value(value)?)?)
            }
            ElementKind::Image => ContentElement::Image(Image::from_value(value)?),
            ElementKind::Gallery => {
                let wire: WireGallery = serde_json::from_value(value)?;
                let images = wire
                    .images
                    .into_iter()
                    .map(Image::from_wire)
                    .collect::<Result<Vec<_>, _>>()?;
                ContentElement::Gallery(ImageGallery {
                    group: wire.group,
                    images,
                })
            }
            ElementKind::Header(level) => {
                let wire: WireText = serde_json::from_value(value)?;
                ContentElement::Header(Header {
                    level,
                    content: inline::render_inline(&wire.content)?,
                })
            }
            ElementKind::Divider(weight) => ContentElement::Divider(weight),
            ElementKind::Table => {
                let wire: WireTable = serde_json::from_value(value)?;
                ContentElement::Table(Table {
                    title: wire.title,
                    rows: wire
                        .contents
                        .into_iter()
                        .map(|row| row.into_iter().map(|c| c.0).collect())
                        .collect(),
                })
            }
            ElementKind::Audio => {
                let wire: WireAudio = serde_json::from_value(value)?;
                ContentElement::Audio(Audio::from_wire(wire, &config.urls.audio_source_prefix)?)
            }
            ElementKind::Video => {
                let wire: WireVideo = serde_json::from_value(value)?;
                ContentElement::Video(Video {
                    id: wire.id,
                    width: wire.width,
                    height: wire.height,
                    caption: inline::render_inline_opt(wire.caption.as_deref())?,
                })
            }
            ElementKind::Map => ContentElement::Map(Map::from_value(value)?),
        };
        Ok(element)
    }
}

/// A token in paragraph text replaced with a site URL after rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InternalLink {
    pub token: String,
    pub web: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Paragraph number as declared in the record.
    pub number: u32,
    pub style: ParagraphStyle,
    /// Rendered inline HTML.
    pub content: String,
    pub internal_links: Vec<InternalLink>,
}

impl Paragraph {
    fn from_wire(style: ParagraphStyle, wire: WireParagraph) -> Result<Self, ElementError> {
        Ok(Self {
            number: wire.number,
            style,
            content: inline::render_inline(&wire.content)?,
            internal_links: wire.internal_links,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePlacement {
    /// Floated left of the text column.
    FloatLeft,
    /// Set in the alternate voice column.
    AltVoice,
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub template: UrlTemplate,
    pub alt: String,
    /// Rendered inline HTML; empty when absent.
    pub caption: String,
    /// Rendered inline HTML; empty when absent.
    pub credit: String,
    pub placement: ImagePlacement,
}

impl Image {
    pub fn from_value(value: Value) -> Result<Self, ElementError> {
        Self::from_wire(serde_json::from_value(value)?)
    }

    fn from_wire(wire: WireImage) -> Result<Self, ElementError> {
        let placement = if wire.float {
            ImagePlacement::FloatLeft
        } else if wire.alt_voice {
            ImagePlacement::AltVoice
        } else {
            ImagePlacement::Inline
        };
        Ok(Self {
            template: UrlTemplate::from_url_format(&wire.url_format)?,
            alt: wire.alt.unwrap_or_default(),
            caption: inline::render_inline_opt(wire.caption.as_deref())?,
            credit: inline::render_inline_opt(wire.credit.as_deref())?,
            placement,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGallery {
    /// Lightbox group shared by every image in the gallery.
    pub group: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub level: HeaderLevel,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    /// Row-major cell text; the first row is the header row.
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    /// Path of the file under the site's audio base.
    pub path: String,
    pub label: String,
}

impl Audio {
    fn from_wire(wire: WireAudio, source_prefix: &str) -> Result<Self, ElementError> {
        let path = wire
            .url
            .strip_prefix(source_prefix)
            .ok_or_else(|| ElementError::AudioSource {
                url: wire.url.clone(),
                prefix: source_prefix.to_string(),
            })?;
        Ok(Self {
            path: path.to_string(),
            label: inline::render_inline(&wire.label)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub caption: String,
}

/// An interactive map: tile set, viewport and markers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    #[serde(deserialize_with = "lenient_text")]
    pub tileset: String,
    pub center: Coordinate,
    #[serde(deserialize_with = "lenient_u32")]
    pub zoom: u32,
    #[serde(deserialize_with = "lenient_u32", alias = "min-zoom")]
    pub min_zoom: u32,
    #[serde(deserialize_with = "lenient_u32", alias = "max-zoom")]
    pub max_zoom: u32,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Map {
    pub fn from_value(value: Value) -> Result<Self, ElementError> {
        let map: Map = serde_json::from_value(value)?;
        if map.zoom < map.min_zoom || map.zoom > map.max_zoom {
            return Err(ElementError::ZoomRange {
                zoom: map.zoom,
                min: map.min_zoom,
                max: map.max_zoom,
            });
        }
        Ok(map)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Marker {
    pub position: Coordinate,
    /// Popup text. Plain text, never markup.
    pub message: String,
}

// =============================================================================
// Wire formats
// =============================================================================

/// True whenever the field is present, whatever its value.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    IgnoredAny::deserialize(deserializer).map(|_| true)
}

#[derive(Deserialize)]
struct WireParagraph {
    #[serde(deserialize_with = "lenient_u32")]
    number: u32,
    content: String,
    #[serde(default, rename = "internal-links", alias = "internal_links")]
    internal_links: Vec<InternalLink>,
}

#[derive(Deserialize)]
struct WireImage {
    #[serde(rename = "url-format")]
    url_format: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    credit: Option<String>,
    #[serde(default, deserialize_with = "present")]
    float: bool,
    #[serde(default, rename = "alt-voice", deserialize_with = "present")]
    alt_voice: bool,
}

#[derive(Deserialize)]
struct WireGallery {
    #[serde(deserialize_with = "lenient_text")]
    group: String,
    images: Vec<WireImage>,
}

#[derive(Deserialize)]
struct WireText {
    content: String,
}

#[derive(Deserialize)]
struct WireCell(#[serde(deserialize_with = "lenient_text")] String);

#[derive(Deserialize)]
struct WireTable {
    title: String,
    contents: Vec<Vec<WireCell>>,
}

#[derive(Deserialize)]
struct WireAudio {
    url: String,
    label: String,
}

#[derive(Deserialize)]
struct WireVideo {
    #[serde(deserialize_with = "lenient_text")]
    id: String,
    #[serde(deserialize_with = "lenient_u32")]
    width: u32,
    #[serde(deserialize_with = "lenient_u32")]
    height: u32,
    #[serde(default)]
    caption: Option<String>,
}
