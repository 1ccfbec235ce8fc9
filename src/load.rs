//! Content record loading.
//!
//! A content file is one JSON document per article:
//!
//! ```text
//! {
//!   "metadata":   { "title", "author", "short-reference", "position",
//!                   "chapter"?, "summary"? },
//!   "content":    [ { "type": "paragraph", ... }, ... ],
//!   "supernotes": { "12": { "commentary": [...], ... }, ... }   (optional)
//! }
//! ```
//!
//! [`ContentRecord`] is the parsed file with element bodies still untyped.
//! [`Article`] is the validated body used for web output; supernotes are
//! built separately by [`crate::supernotes`], so a file can be rendered in
//! one mode even when the other part is absent.
//!
//! Input discovery also lives here: command-line paths may be files or
//! directories, and a fixed list of file names is never treated as content.

use crate::config::RenderConfig;
use crate::document::{ContentElement, ElementError, ElementKind};
use crate::naming::is_skipped;
use crate::types::{lenient_text, lenient_text_opt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata: {0}")]
    Metadata(serde_json::Error),
    #[error("metadata: short-reference {0:?} is not a usable directory name")]
    ShortReference(String),
    #[error("content[{index}]: element has no string `type` tag")]
    MissingTag { index: usize },
    #[error("content[{index}] ({tag}): {source}")]
    Element {
        index: usize,
        tag: String,
        #[source]
        source: ElementError,
    },
}

/// Article-level metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleMetadata {
    pub title: String,
    /// Author entries as authored: plain names or objects with a `name`,
    /// either alone or in a list.
    #[serde(
        default,
        rename = "author",
        alias = "authors",
        deserialize_with = "one_or_many"
    )]
    pub authors: Vec<Value>,
    #[serde(rename = "short-reference")]
    pub short_reference: String,
    /// Table-of-contents position.
    #[serde(rename = "position", deserialize_with = "lenient_text")]
    pub toc: String,
    #[serde(default, deserialize_with = "lenient_text_opt")]
    pub chapter: Option<String>,
    #[serde(default, rename = "summary")]
    pub excerpt: Option<String>,
}

impl ArticleMetadata {
    /// Names of the authors that can be resolved to text.
    pub fn author_names(&self) -> Vec<String> {
        self.authors
            .iter()
            .filter_map(|author| match author {
                Value::String(name) => Some(name.trim().to_string()),
                Value::Object(fields) => fields
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| name.trim().to_string()),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(Value::Null) => Vec::new(),
        OneOrMany::One(value) => vec![value],
    })
}

#[derive(Deserialize)]
struct WireRecord {
    metadata: Value,
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    supernotes: Option<serde_json::Map<String, Value>>,
}

/// A parsed content file.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub metadata: ArticleMetadata,
    /// Element objects in document order, not yet validated.
    pub content: Vec<Value>,
    /// Supernotes keyed by paragraph number string.
    pub supernotes: Option<serde_json::Map<String, Value>>,
}

impl ContentRecord {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let wire: WireRecord = serde_json::from_str(text)?;
        let metadata: ArticleMetadata =
            serde_json::from_value(wire.metadata).map_err(LoadError::Metadata)?;
        let slug = metadata.short_reference.as_str();
        if slug.is_empty() || slug == "." || slug == ".." || slug.contains(['/', '\\']) {
            return Err(LoadError::ShortReference(metadata.short_reference));
        }
        Ok(Self {
            metadata,
            content: wire.content,
            supernotes: wire.supernotes,
        })
    }
}

/// An element whose `type` tag is outside the supported set.
///
/// These never reach the renderer; they are reported so content loss is
/// visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedElement {
    pub index: usize,
    pub tag: String,
}

/// The validated body of an article.
#[derive(Debug, Clone)]
pub struct Article {
    pub metadata: ArticleMetadata,
    pub elements: Vec<ContentElement>,
    pub dropped: Vec<DroppedElement>,
}

impl Article {
    /// Validate every element of `record`, failing on the first invalid one.
    pub fn from_record(record: &ContentRecord, config: &RenderConfig) -> Result<Self, LoadError> {
        let mut elements = Vec::with_capacity(record.content.len());
        let mut dropped = Vec::new();

        for (index, value) in record.content.iter().enumerate() {
            let tag = value
                .get("type")
                .and_then(Value::as_str)
                .ok_or(LoadError::MissingTag { index })?;

            let Some(kind) = ElementKind::from_tag(tag) else {
                warn!(
                    article = %record.metadata.short_reference,
                    index,
                    tag,
                    "dropping element with unrecognized type"
                );
                dropped.push(DroppedElement {
                    index,
                    tag: tag.to_string(),
                });
                continue;
            };

            let element = ContentElement::build(kind, value.clone(), config).map_err(|source| {
                LoadError::Element {
                    index,
                    tag: tag.to_string(),
                    source,
                }
            })?;
            elements.push(element);
        }

        debug!(
            article = %record.metadata.short_reference,
            elements = elements.len(),
            dropped = dropped.len(),
            "article loaded"
        );

        Ok(Self {
            metadata: record.metadata.clone(),
            elements,
            dropped,
        })
    }
}

/// Expand command-line paths into the content files to process.
///
/// Files are taken as given; directories are walked for `*.json` files in
/// sorted order. Names in `skip_names` are dropped either way. A file reached
/// more than once (named directly and found in a directory, or through two
/// spellings of one path) is kept at its first position only.
pub fn discover_inputs(paths: &[PathBuf], skip_names: &[String]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .map(|e| e.eq_ignore_ascii_case("json"))
                        .unwrap_or(false)
                })
                .collect();
            found.sort();
            inputs.extend(found);
        } else {
            inputs.push(path.clone());
        }
    }
    inputs.retain(|p| {
        let skip = is_skipped(p, skip_names);
        if skip {
            debug!(path = %p.display(), "skipping non-article file");
        }
        !skip
    });
    let mut seen = HashSet::new();
    inputs.retain(|p| {
        let key = p.canonicalize().unwrap_or_else(|_| p.clone());
        let first = seen.insert(key);
        if !first {
            debug!(path = %p.display(), "skipping repeated input");
        }
        first
    });
    inputs
}
