//! Inline Markdown rendering for short text fields.
//!
//! Captions, credits, labels, headers and paragraph bodies are authored as
//! one-line Markdown. `pulldown-cmark` always wraps such input in a single
//! `<p>` block; the fields are embedded inside our own wrappers, so only the
//! paragraph's inner events are rendered.
//!
//! Input that does not produce exactly one paragraph (a heading, a list, two
//! paragraphs) is rejected instead of being cropped into garbled markup.

use pulldown_cmark::{Event, Parser, Tag, TagEnd, html};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InlineError {
    #[error("expected a single paragraph of inline text, found block markup in {0:?}")]
    NotSingleParagraph(String),
}

const EXCERPT_LEN: usize = 40;

/// Render `text` as inline HTML with the wrapping paragraph removed.
///
/// Whitespace-only input renders to an empty string.
pub fn render_inline(text: &str) -> Result<String, InlineError> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }

    let events: Vec<Event> = Parser::new(text).collect();
    let starts = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::Paragraph)))
        .count();
    let wrapped = starts == 1
        && matches!(events.first(), Some(Event::Start(Tag::Paragraph)))
        && matches!(events.last(), Some(Event::End(TagEnd::Paragraph)));
    if !wrapped {
        return Err(InlineError::NotSingleParagraph(excerpt(text)));
    }

    let mut out = String::with_capacity(text.len() + 16);
    html::push_html(&mut out, events[1..events.len() - 1].iter().cloned());
    Ok(out)
}

/// Like [`render_inline`] for optional fields; missing text renders empty.
pub fn render_inline_opt(text: Option<&str>) -> Result<String, InlineError> {
    text.map(render_inline).transpose().map(Option::unwrap_or_default)
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_paragraph_wrapper() {
        assert_eq!(render_inline("plain words").unwrap(), "plain words");
    }

    #[test]
    fn keeps_inline_markup() {
        assert_eq!(
            render_inline("some *emphasis* and **weight**").unwrap(),
            "some <em>emphasis</em> and <strong>weight</strong>"
        );
    }

    #[test]
    fn renders_links() {
        assert_eq!(
            render_inline("[home](/index.html)").unwrap(),
            r#"<a href="/index.html">home</a>"#
        );
    }

    #[test]
    fn escapes_ampersands() {
        assert_eq!(render_inline("Smith & Sons").unwrap(), "Smith &amp; Sons");
    }

    #[test]
    fn empty_and_blank_input_render_empty() {
        assert_eq!(render_inline("").unwrap(), "");
        assert_eq!(render_inline("   \n").unwrap(), "");
    }

    #[test]
    fn optional_missing_renders_empty() {
        assert_eq!(render_inline_opt(None).unwrap(), "");
        assert_eq!(render_inline_opt(Some("*x*")).unwrap(), "<em>x</em>");
    }

    #[test]
    fn two_paragraphs_are_rejected() {
        let err = render_inline("first\n\nsecond").unwrap_err();
        assert!(matches!(err, InlineError::NotSingleParagraph(_)));
    }

    #[test]
    fn heading_is_rejected() {
        assert!(render_inline("# Title").is_err());
    }

    #[test]
    fn list_is_rejected() {
        assert!(render_inline("- one\n- two").is_err());
    }

    #[test]
    fn error_excerpt_is_truncated() {
        let long = format!("# {}", "x".repeat(100));
        let InlineError::NotSingleParagraph(excerpt) = render_inline(&long).unwrap_err();
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.len() < 50);
    }
}
