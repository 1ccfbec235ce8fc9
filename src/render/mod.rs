//! Element renderers.
//!
//! One renderer per [`ContentElement`] variant, each a pure function from the
//! element (plus the issue context and configuration it needs for URLs) to
//! [`Markup`]. Markup is built with maud, so alt text, table cells, titles
//! and attribute values are escaped; only fields that were already rendered
//! from Markdown are inserted as `PreEscaped`.
//!
//! | Module | Elements |
//! |--------|----------|
//! | [`paragraph`] | paragraph styles, internal-link substitution |
//! | [`image`] | inline images and galleries |
//! | [`structure`] | headers, dividers, tables |
//! | [`media`] | audio and video embeds |
//! | [`map`] | map containers with a JSON configuration payload |

pub mod image;
pub mod map;
pub mod media;
pub mod paragraph;
pub mod structure;

use crate::config::RenderConfig;
use crate::document::ContentElement;
use crate::types::ArticleContext;
use maud::Markup;

/// Per-article render state.
///
/// Maps are numbered in document order starting at 0 for every article, so
/// the DOM ids are stable across re-renders.
#[derive(Debug, Default)]
pub struct RenderState {
    next_map: usize,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_map_index(&mut self) -> usize {
        let index = self.next_map;
        self.next_map += 1;
        index
    }
}

/// Render one element.
pub fn render_element(
    element: &ContentElement,
    ctx: &ArticleContext,
    config: &RenderConfig,
    state: &mut RenderState,
) -> Markup {
    match element {
        ContentElement::Paragraph(p) => paragraph::render_paragraph(p, &config.paragraphs),
        ContentElement::Image(img) => image::render_image(img, ctx, &config.urls),
        ContentElement::Gallery(gallery) => image::render_gallery(gallery, ctx, &config.urls),
        ContentElement::Header(header) => structure::render_header(header),
        ContentElement::Divider(weight) => structure::render_divider(*weight),
        ContentElement::Table(table) => structure::render_table(table),
        ContentElement::Audio(audio) => media::render_audio(audio, &config.urls),
        ContentElement::Video(video) => media::render_video(video, &config.urls),
        ContentElement::Map(m) => map::render_map(m, state.take_map_index()),
    }
}
