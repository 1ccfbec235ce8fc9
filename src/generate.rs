//! Article assembly and output.
//!
//! Rendering and writing are separate steps. Everything an article produces
//! is rendered to strings first, so an invalid record or a YAML failure
//! never touches the output directory. Writing then places each file under
//! the article directory:
//!
//! ```text
//! {root}/issue-{volume}-{number}/{short-reference}/
//! ├── web_content.html     # web mode
//! ├── metadata.yml         # web mode
//! └── supernotes.json      # supernotes mode
//! ```
//!
//! Every file is first written to a uniquely named temporary file in the
//! article directory. Only when all of them exist are they renamed into
//! place, so a reader never sees a half-written file. If a rename still
//! fails, files already replaced get their previous contents back. If the
//! article directory did not exist before, it is removed again. An existing
//! directory is reused as is.

use crate::config::RenderConfig;
use crate::load::Article;
use crate::metadata::FrontMatter;
use crate::naming::{self, METADATA_FILE, SUPERNOTES_FILE, WEB_CONTENT_FILE};
use crate::render::{RenderState, render_element};
use crate::supernotes::{SupernoteCollection, SupernoteError};
use crate::types::ArticleContext;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Supernotes(#[from] SupernoteError),
}

/// A fully rendered output file, not yet on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    /// File name relative to the article directory.
    pub name: &'static str,
    pub contents: String,
}

/// Render an article body: every element in source order, each followed by
/// a blank line. Map numbering restarts at 0 for every call.
pub fn render_body(article: &Article, ctx: &ArticleContext, config: &RenderConfig) -> String {
    let mut state = RenderState::new();
    let mut body = String::new();
    for element in &article.elements {
        body.push_str(&render_element(element, ctx, config, &mut state).into_string());
        body.push_str("\n\n");
    }
    body
}

/// `web_content.html` and `metadata.yml` for an article.
pub fn web_files(
    article: &Article,
    ctx: &ArticleContext,
    config: &RenderConfig,
) -> Result<Vec<RenderedFile>, GenerateError> {
    let front_matter = FrontMatter::new(&article.metadata, ctx).to_yaml()?;
    Ok(vec![
        RenderedFile {
            name: WEB_CONTENT_FILE,
            contents: render_body(article, ctx, config),
        },
        RenderedFile {
            name: METADATA_FILE,
            contents: front_matter,
        },
    ])
}

/// `supernotes.json` for a collection.
pub fn supernote_files(collection: &SupernoteCollection) -> Result<Vec<RenderedFile>, GenerateError> {
    Ok(vec![RenderedFile {
        name: SUPERNOTES_FILE,
        contents: collection.to_json()?,
    }])
}

/// Render and write the web output of an article. Returns the article
/// directory.
pub fn write_web(
    root: &Path,
    ctx: &ArticleContext,
    article: &Article,
    config: &RenderConfig,
) -> Result<PathBuf, GenerateError> {
    let files = web_files(article, ctx, config)?;
    write_files(root, ctx, &article.metadata.short_reference, &files)
}

/// Render and write `supernotes.json`. Returns the article directory.
pub fn write_supernotes(
    root: &Path,
    ctx: &ArticleContext,
    short_reference: &str,
    collection: &SupernoteCollection,
) -> Result<PathBuf, GenerateError> {
    let files = supernote_files(collection)?;
    write_files(root, ctx, short_reference, &files)
}

/// Write rendered files into the article directory.
///
/// Either every file is replaced or none is.
pub fn write_files(
    root: &Path,
    ctx: &ArticleContext,
    short_reference: &str,
    files: &[RenderedFile],
) -> Result<PathBuf, GenerateError> {
    let dir = naming::article_dir(root, ctx, short_reference);
    let created = !dir.exists();
    fs::create_dir_all(&dir)?;

    if let Err(err) = commit(&dir, files) {
        if created {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                warn!(path = %dir.display(), error = %cleanup, "could not remove partial output");
            }
        }
        return Err(err.into());
    }
    Ok(dir)
}

/// A file written to a temporary name, waiting to be renamed over `target`.
struct Staged {
    target: PathBuf,
    /// Contents of `target` before this write, if it existed.
    previous: Option<Vec<u8>>,
    file: NamedTempFile,
}

fn commit(dir: &Path, files: &[RenderedFile]) -> io::Result<()> {
    // Unpersisted temp files are deleted on drop.
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let target = dir.join(file.name);
        let previous = read_existing(&target)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(file.contents.as_bytes())?;
        staged.push(Staged {
            target,
            previous,
            file: tmp,
        });
    }

    let mut replaced: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for Staged {
        target,
        previous,
        file,
    } in staged
    {
        match file.persist(&target) {
            Ok(_) => {
                debug!(path = %target.display(), "wrote");
                replaced.push((target, previous));
            }
            Err(err) => {
                restore(&replaced);
                return Err(err.error);
            }
        }
    }
    Ok(())
}

fn read_existing(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Put back what an unfinished commit already replaced.
fn restore(replaced: &[(PathBuf, Option<Vec<u8>>)]) {
    for (target, previous) in replaced.iter().rev() {
        let result = match previous {
            Some(bytes) => fs::write(target, bytes),
            None => fs::remove_file(target),
        };
        if let Err(err) = result {
            warn!(path = %target.display(), error = %err, "could not restore previous output");
        }
    }
}
