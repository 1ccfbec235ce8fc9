//! `metadata.yml` front matter for the publishing pipeline.
//!
//! The site generator reads a `---` fenced YAML block per article:
//!
//! ```yaml
//! ---
//! layout: article
//! title: The Road North
//! authors:
//! - Ada Lovelace
//! excerpt: A journey in three parts.
//! permalink: null
//! toc: 3
//! chapter: 1
//! volume: 2
//! number: 4
//! ---
//! ```
//!
//! Keys are always written in this order; `chapter` only when the record has
//! one. Values that look like integers (`"3"`, `4`) are written as YAML
//! integers so the site can sort on them. Everything else goes through
//! `serde_yaml`, which quotes titles containing `:` or `#` as needed.

use crate::load::ArticleMetadata;
use crate::types::ArticleContext;
use serde::Serialize;
use serde_yaml::{Number, Value};

const LAYOUT: &str = "article";

/// Front matter of one article, serialized in field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub layout: &'static str,
    pub title: String,
    pub authors: Vec<String>,
    pub excerpt: Option<String>,
    /// Assigned by the site; always written empty.
    pub permalink: Option<String>,
    pub toc: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<Value>,
    pub volume: Value,
    pub number: Value,
}

impl FrontMatter {
    pub fn new(metadata: &ArticleMetadata, ctx: &ArticleContext) -> Self {
        Self {
            layout: LAYOUT,
            title: metadata.title.clone(),
            authors: metadata.author_names(),
            excerpt: metadata.excerpt.clone(),
            permalink: None,
            toc: integer_or_text(&metadata.toc),
            chapter: metadata.chapter.as_deref().map(integer_or_text),
            volume: integer_or_text(&ctx.volume),
            number: integer_or_text(&ctx.number),
        }
    }

    /// The fenced YAML document.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("---\n{body}---\n"))
    }
}

fn integer_or_text(text: &str) -> Value {
    match text.trim().parse::<u64>() {
        Ok(n) => Value::Number(Number::from(n)),
        Err(_) => Value::String(text.to_string()),
    }
}
