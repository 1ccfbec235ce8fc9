//! # Appendix Render
//!
//! Renders Appendix article content records into the files the journal's
//! static site is built from. Each content record is a JSON document holding
//! an article's metadata, its body as an ordered list of typed elements, and
//! optional supernotes (margin annotations keyed by paragraph).
//!
//! # Pipeline
//!
//! ```text
//! record.json ─ load ─▶ Article ─ render ─▶ web_content.html
//!                  │                  └───▶ metadata.yml
//!                  └─ supernotes ─▶ SupernoteCollection ─▶ supernotes.json
//!                                                     └──▶ CDN image URLs
//! ```
//!
//! Loading validates everything up front: element tags are resolved to a
//! closed set, Markdown fields are rendered, image templates are checked for
//! their size placeholder. Rendering is then infallible and pure, and
//! writing happens only once all of an article's files exist in memory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`load`] | Content record parsing, article validation, input discovery |
//! | [`document`] | Content element types and their construction from JSON |
//! | [`inline`] | Single-paragraph Markdown rendering for text fields |
//! | [`render`] | One Maud renderer per element type |
//! | [`generate`] | Body assembly and atomic article output |
//! | [`metadata`] | `metadata.yml` front matter |
//! | [`supernotes`] | Supernote extraction and CDN image listing |
//! | [`process`] | Parallel batch processing with progress events |
//! | [`config`] | `render.toml` loading, merging and validation |
//! | [`types`] | Issue context, URL templates, lenient scalar parsing |
//! | [`naming`] | Output directory layout and skipped input names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud For Element Markup
//!
//! Element HTML is built with [Maud](https://maud.lambda.xyz/). Every
//! interpolated value is escaped unless it is explicitly wrapped as
//! `PreEscaped`, and the only values wrapped that way are the output of the
//! Markdown renderer. Author text in alt attributes, table cells and map
//! markers cannot inject markup.
//!
//! ## Explicit Output Root
//!
//! Paths are built from an output root passed in by the caller rather than
//! from the process working directory, so articles can be written from
//! parallel workers and tests can point at a temporary directory.

pub mod config;
pub mod document;
pub mod generate;
pub mod inline;
pub mod load;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod render;
pub mod supernotes;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
