//! Batch processing of content files.
//!
//! Every input file is an independent article. The batch renders them in
//! parallel with [rayon](https://docs.rs/rayon), then writes them grouped by
//! article directory: one worker per directory, so no two workers ever touch
//! the same file. A failing article is reported and the rest of the batch
//! carries on.
//!
//! ## Modes
//!
//! | Mode | Reads | Writes |
//! |------|-------|--------|
//! | [`Mode::Web`] | metadata + content | `web_content.html`, `metadata.yml` |
//! | [`Mode::Supernotes`] | metadata + supernotes | `supernotes.json` (only when present) |
//! | [`Mode::Build`] | everything | all three |
//! | [`Mode::Check`] | everything | nothing |
//!
//! In build mode both outputs are rendered before anything is written, so a
//! bad supernote also keeps the web files from being written.
//!
//! ## Progress
//!
//! When a sender is given, one [`ProcessEvent`] is sent per article as soon
//! as it finishes. Events arrive in completion order; the returned
//! [`BatchSummary`] is in input order.

use crate::config::RenderConfig;
use crate::generate::{self, GenerateError, RenderedFile};
use crate::load::{Article, ContentRecord, DroppedElement, LoadError};
use crate::naming;
use crate::supernotes::{SupernoteCollection, SupernoteError};
use crate::types::ArticleContext;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0}")]
    Load(#[from] LoadError),
    #[error("supernotes: {0}")]
    Supernotes(#[from] SupernoteError),
    #[error("{0}")]
    Generate(#[from] GenerateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Web,
    Supernotes,
    Build,
    Check,
}

impl Mode {
    fn renders_web(self) -> bool {
        matches!(self, Mode::Web | Mode::Build | Mode::Check)
    }

    fn renders_supernotes(self) -> bool {
        matches!(self, Mode::Supernotes | Mode::Build | Mode::Check)
    }

    fn writes(self) -> bool {
        self != Mode::Check
    }
}

/// What happened to one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleReport {
    pub source: PathBuf,
    pub title: String,
    pub short_reference: String,
    /// Article directory, when anything was written.
    pub output_dir: Option<PathBuf>,
    /// Names of the files rendered (and written, outside check mode).
    pub files: Vec<&'static str>,
    /// Number of rendered content elements; zero when content was not read.
    pub elements: usize,
    pub dropped: Vec<DroppedElement>,
}

#[derive(Debug)]
pub struct ArticleFailure {
    pub source: PathBuf,
    pub error: ProcessError,
}

/// Progress event sent as each article finishes.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Rendered(ArticleReport),
    Failed { source: PathBuf, error: String },
}

/// Outcome of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub rendered: Vec<ArticleReport>,
    pub failed: Vec<ArticleFailure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn dropped_count(&self) -> usize {
        self.rendered.iter().map(|r| r.dropped.len()).sum()
    }
}

/// An article rendered in memory, not yet written.
struct PreparedArticle {
    report: ArticleReport,
    files: Vec<RenderedFile>,
}

impl PreparedArticle {
    fn writes(&self, mode: Mode) -> bool {
        mode.writes() && !self.files.is_empty()
    }
}

fn prepare_article(
    source: &Path,
    ctx: &ArticleContext,
    mode: Mode,
    config: &RenderConfig,
) -> Result<PreparedArticle, ProcessError> {
    debug!(source = %source.display(), ?mode, "processing article");
    let record = ContentRecord::from_path(source)?;

    let mut files: Vec<RenderedFile> = Vec::new();
    let mut elements = 0;
    let mut dropped = Vec::new();

    if mode.renders_web() {
        let article = Article::from_record(&record, config)?;
        files.extend(generate::web_files(&article, ctx, config)?);
        elements = article.elements.len();
        dropped = article.dropped;
    }
    if mode.renders_supernotes() {
        if let Some(collection) = SupernoteCollection::from_record(&record)? {
            files.extend(generate::supernote_files(&collection)?);
        }
    }

    Ok(PreparedArticle {
        report: ArticleReport {
            source: source.to_path_buf(),
            title: record.metadata.title,
            short_reference: record.metadata.short_reference,
            output_dir: None,
            files: files.iter().map(|f| f.name).collect(),
            elements,
            dropped,
        },
        files,
    })
}

fn write_article(
    article: &PreparedArticle,
    ctx: &ArticleContext,
    output_root: &Path,
) -> Result<ArticleReport, ProcessError> {
    let dir = generate::write_files(
        output_root,
        ctx,
        &article.report.short_reference,
        &article.files,
    )?;
    Ok(ArticleReport {
        output_dir: Some(dir),
        ..article.report.clone()
    })
}

/// Render and write a single content file.
pub fn process_article(
    source: &Path,
    ctx: &ArticleContext,
    output_root: &Path,
    mode: Mode,
    config: &RenderConfig,
) -> Result<ArticleReport, ProcessError> {
    let article = prepare_article(source, ctx, mode, config)?;
    if article.writes(mode) {
        write_article(&article, ctx, output_root)
    } else {
        Ok(article.report)
    }
}

fn event_for(source: &Path, result: Result<&ArticleReport, &ProcessError>) -> ProcessEvent {
    match result {
        Ok(report) => ProcessEvent::Rendered(report.clone()),
        Err(error) => ProcessEvent::Failed {
            source: source.to_path_buf(),
            error: error.to_string(),
        },
    }
}

fn notify(progress: &Option<Sender<ProcessEvent>>, event: impl FnOnce() -> ProcessEvent) {
    if let Some(tx) = progress {
        // The receiver only goes away if the printer thread died.
        let _ = tx.send(event());
    }
}

/// Articles to write, grouped by target directory. Each group keeps input
/// order.
fn write_groups<'a>(
    prepared: &'a [Result<PreparedArticle, ProcessError>],
    ctx: &ArticleContext,
    output_root: &Path,
    mode: Mode,
) -> Vec<Vec<(usize, &'a PreparedArticle)>> {
    let mut groups: BTreeMap<PathBuf, Vec<(usize, &PreparedArticle)>> = BTreeMap::new();
    for (index, result) in prepared.iter().enumerate() {
        if let Ok(article) = result {
            if article.writes(mode) {
                let dir = naming::article_dir(output_root, ctx, &article.report.short_reference);
                groups.entry(dir).or_default().push((index, article));
            }
        }
    }
    for (dir, group) in &groups {
        if group.len() > 1 {
            warn!(
                path = %dir.display(),
                articles = group.len(),
                "several inputs share an article directory; the last one wins"
            );
        }
    }
    groups.into_values().collect()
}

/// Process every input in parallel on the global rayon pool.
///
/// All articles are rendered in parallel first. Writes then run in parallel
/// across article directories, and in input order within one directory, so
/// inputs sharing a short reference leave the last one's output.
pub fn process_batch(
    inputs: &[PathBuf],
    ctx: &ArticleContext,
    output_root: &Path,
    mode: Mode,
    config: &RenderConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> BatchSummary {
    info!(articles = inputs.len(), ?mode, "starting batch");

    let prepared: Vec<Result<PreparedArticle, ProcessError>> = inputs
        .par_iter()
        .map(|source| {
            let result = prepare_article(source, ctx, mode, config);
            match &result {
                Err(error) => notify(&progress, || event_for(source, Err(error))),
                Ok(article) if !article.writes(mode) => {
                    notify(&progress, || event_for(source, Ok(&article.report)))
                }
                Ok(_) => {}
            }
            result
        })
        .collect();

    let groups = write_groups(&prepared, ctx, output_root, mode);
    let mut written: HashMap<usize, Result<ArticleReport, ProcessError>> = groups
        .par_iter()
        .flat_map_iter(|group| {
            group
                .iter()
                .map(|&(index, article)| {
                    let result = write_article(article, ctx, output_root);
                    notify(&progress, || {
                        event_for(&article.report.source, result.as_ref())
                    });
                    (index, result)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (index, (source, result)) in inputs.iter().zip(prepared).enumerate() {
        let result =
            result.and_then(|article| written.remove(&index).unwrap_or(Ok(article.report)));
        match result {
            Ok(report) => summary.rendered.push(report),
            Err(error) => summary.failed.push(ArticleFailure {
                source: source.clone(),
                error,
            }),
        }
    }
    info!(
        rendered = summary.rendered.len(),
        failed = summary.failed.len(),
        "batch finished"
    );
    summary
}

/// CDN image URLs referenced by a file's supernotes. Files without
/// supernotes list nothing.
pub fn image_listing(source: &Path, config: &RenderConfig) -> Result<Vec<String>, ProcessError> {
    let record = ContentRecord::from_path(source)?;
    Ok(SupernoteCollection::from_record(&record)?
        .map(|collection| collection.image_urls(&config.urls.image_cdn_base))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{METADATA_FILE, SUPERNOTES_FILE, WEB_CONTENT_FILE};
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn ctx() -> ArticleContext {
        ArticleContext::new("2", "4")
    }

    fn record_with_supernotes(short_reference: &str) -> String {
        json!({
            "metadata": {"title": "Noted", "short-reference": short_reference, "position": 1},
            "content": [paragraph(1, "text")],
            "supernotes": {"1": {"image": [
                {"url-format": "/9/***-a.jpg"},
                {"url-format": "/9/***-b.jpg"}
            ]}}
        })
        .to_string()
    }

    #[test]
    fn web_mode_writes_html_and_front_matter() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_json(vec![paragraph(1, "x")]));
        let out = tmp.path().join("out");

        let report = process_article(&src, &ctx(), &out, Mode::Web, &test_config()).unwrap();
        let dir = report.output_dir.unwrap();
        assert_eq!(dir, out.join("issue-2-4/test-article"));
        assert!(dir.join(WEB_CONTENT_FILE).exists());
        assert!(dir.join(METADATA_FILE).exists());
        assert!(!dir.join(SUPERNOTES_FILE).exists());
        assert_eq!(report.elements, 1);
    }

    #[test]
    fn supernotes_mode_skips_files_without_notes() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_json(vec![]));
        let out = tmp.path().join("out");

        let report =
            process_article(&src, &ctx(), &out, Mode::Supernotes, &test_config()).unwrap();
        assert_eq!(report.output_dir, None);
        assert!(report.files.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn supernotes_mode_ignores_invalid_content() {
        let tmp = TempDir::new().unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&record_with_supernotes("noted")).unwrap();
        value["content"] = json!([{"type": "image", "url-format": "/no-wildcard.jpg"}]);
        let src = write_record(tmp.path(), "a.json", &value.to_string());

        let report = process_article(
            &src,
            &ctx(),
            &tmp.path().join("out"),
            Mode::Supernotes,
            &test_config(),
        )
        .unwrap();
        assert_eq!(report.files, vec![SUPERNOTES_FILE]);
    }

    #[test]
    fn build_mode_writes_everything() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_with_supernotes("noted"));
        let report = process_article(
            &src,
            &ctx(),
            &tmp.path().join("out"),
            Mode::Build,
            &test_config(),
        )
        .unwrap();
        assert_eq!(
            report.files,
            vec![WEB_CONTENT_FILE, METADATA_FILE, SUPERNOTES_FILE]
        );
    }

    #[test]
    fn check_mode_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_with_supernotes("noted"));
        let out = tmp.path().join("out");
        let report = process_article(&src, &ctx(), &out, Mode::Check, &test_config()).unwrap();
        assert_eq!(report.output_dir, None);
        assert_eq!(report.files.len(), 3);
        assert!(!out.exists());
    }

    #[test]
    fn invalid_article_leaves_no_directory() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(
            tmp.path(),
            "bad.json",
            &record_json(vec![
                paragraph(1, "fine"),
                json!({"type": "image", "url-format": "/no-wildcard.jpg"}),
            ]),
        );
        let out = tmp.path().join("out");
        let err = process_article(&src, &ctx(), &out, Mode::Web, &test_config()).unwrap_err();
        assert!(matches!(err, ProcessError::Load(LoadError::Element { index: 1, .. })));
        assert!(!out.join("issue-2-4/test-article").exists());
    }

    // =========================================================================
    // Batch
    // =========================================================================

    #[test]
    fn batch_continues_past_failures() {
        let tmp = TempDir::new().unwrap();
        let good = write_record(tmp.path(), "good.json", &record_json(vec![paragraph(1, "x")]));
        let bad = write_record(tmp.path(), "bad.json", "{ not json");
        let other = write_record(tmp.path(), "other.json", &record_with_supernotes("other"));
        let out = tmp.path().join("out");

        let summary = process_batch(
            &[good.clone(), bad.clone(), other.clone()],
            &ctx(),
            &out,
            Mode::Web,
            &test_config(),
            None,
        );
        assert!(!summary.is_success());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].source, bad);
        let sources: Vec<&PathBuf> = summary.rendered.iter().map(|r| &r.source).collect();
        assert_eq!(sources, vec![&good, &other]);
        assert!(out.join("issue-2-4/other").is_dir());
    }

    #[test]
    fn batch_sends_one_event_per_article() {
        let tmp = TempDir::new().unwrap();
        let a = write_record(tmp.path(), "a.json", &record_json(vec![]));
        let b = write_record(tmp.path(), "b.json", "[]");
        let (tx, rx) = std::sync::mpsc::channel();

        process_batch(
            &[a, b],
            &ctx(),
            &tmp.path().join("out"),
            Mode::Check,
            &test_config(),
            Some(tx),
        );
        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ProcessEvent::Failed { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn dropped_elements_are_counted() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(
            tmp.path(),
            "a.json",
            &record_json(vec![json!({"type": "unknown-widget"}), paragraph(1, "x")]),
        );
        let summary = process_batch(
            &[src],
            &ctx(),
            &tmp.path().join("out"),
            Mode::Check,
            &test_config(),
            None,
        );
        assert_eq!(summary.dropped_count(), 1);
    }

    #[test]
    fn shared_short_reference_last_input_wins() {
        let tmp = TempDir::new().unwrap();
        let inputs: Vec<PathBuf> = (0..16)
            .map(|i| {
                write_record(
                    tmp.path(),
                    &format!("{i:02}.json"),
                    &record_json(vec![paragraph(1, &format!("article {i}"))]),
                )
            })
            .collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(8)
            .build()
            .unwrap();

        for round in 0..20 {
            let out = tmp.path().join(format!("out-{round}"));
            let summary = pool.install(|| {
                process_batch(&inputs, &ctx(), &out, Mode::Web, &test_config(), None)
            });
            assert!(summary.is_success(), "{:?}", summary.failed);
            assert_eq!(summary.rendered.len(), 16);

            let html =
                std::fs::read_to_string(out.join("issue-2-4/test-article").join(WEB_CONTENT_FILE))
                    .unwrap();
            assert!(html.contains(">article 15</p>"), "{html}");
        }
    }

    #[test]
    fn write_failure_reported_per_article() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_json(vec![]));
        let out = tmp.path().join("out");
        std::fs::create_dir_all(out.join("issue-2-4/test-article").join(WEB_CONTENT_FILE))
            .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = process_batch(&[src.clone()], &ctx(), &out, Mode::Web, &test_config(), Some(tx));
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].error, ProcessError::Generate(_)));
        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert!(matches!(&events[..], [ProcessEvent::Failed { source, .. }] if *source == src));
    }

    // =========================================================================
    // Image listing
    // =========================================================================

    #[test]
    fn image_listing_uses_cdn_base() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_with_supernotes("noted"));
        let urls = image_listing(&src, &test_config()).unwrap();
        assert_eq!(urls.len(), 6);
        assert_eq!(
            urls[0],
            "http://s3.amazonaws.com/appendixjournal-images/images/attachments/9/medium-a.jpg"
        );
        assert!(urls[2].ends_with("/9/thumbnail-a.jpg"));
    }

    #[test]
    fn image_listing_without_supernotes_is_empty() {
        let tmp = TempDir::new().unwrap();
        let src = write_record(tmp.path(), "a.json", &record_json(vec![]));
        assert!(image_listing(&src, &test_config()).unwrap().is_empty());
    }
}
