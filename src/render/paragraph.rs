//! Paragraph rendering.

use crate::config::ParagraphConfig;
use crate::document::{InternalLink, Paragraph, ParagraphStyle};
use maud::{Markup, PreEscaped, html};

/// Render a paragraph: a `<!-- N -->` marker comment, then the styled wrapper.
///
/// Internal-link tokens are replaced afterwards across the whole output, in
/// the order the links are listed. A later token may match text produced by
/// an earlier replacement.
pub fn render_paragraph(paragraph: &Paragraph, config: &ParagraphConfig) -> Markup {
    let id = config.anchor_for(paragraph.number);
    let body = PreEscaped(paragraph.content.as_str());

    let markup = html! {
        (PreEscaped(format!("<!-- {} -->\n", paragraph.number)))
        @match paragraph.style {
            ParagraphStyle::Plain => {
                p id=[id] { (body) }
            },
            ParagraphStyle::EditorialIntro => {
                p.editorial-intro id=[id] { (body) }
            },
            ParagraphStyle::AltVoice => {
                p.alternate-voice id=[id] { (body) }
            },
            ParagraphStyle::StageDirection => {
                p.stage-direction id=[id] { (body) }
            },
            ParagraphStyle::Blockquote => {
                blockquote id=[id] {
                    p { (body) }
                }
            },
        }
    };

    substitute_links(markup, &paragraph.internal_links)
}

fn substitute_links(markup: Markup, links: &[InternalLink]) -> Markup {
    if links.is_empty() {
        return markup;
    }
    let html = links
        .iter()
        .filter(|link| !link.token.is_empty())
        .fold(markup.into_string(), |html, link| {
            html.replace(&link.token, &link.web)
        });
    PreEscaped(html)
}
