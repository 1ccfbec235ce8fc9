//! Output path naming and input file-name filtering.
//!
//! Every article lands in a directory keyed by issue and short reference:
//!
//! ```text
//! {output_root}/
//! └── issue-{volume}-{number}/
//!     └── {short-reference}/
//!         ├── web_content.html
//!         ├── metadata.yml
//!         └── supernotes.json
//! ```
//!
//! Paths are always built from an explicit root; nothing depends on the
//! process working directory.

use crate::types::ArticleContext;
use std::path::{Path, PathBuf};

pub const WEB_CONTENT_FILE: &str = "web_content.html";
pub const METADATA_FILE: &str = "metadata.yml";
pub const SUPERNOTES_FILE: &str = "supernotes.json";

/// `issue-{volume}-{number}`
pub fn issue_dir_name(ctx: &ArticleContext) -> String {
    format!("issue-{}-{}", ctx.volume, ctx.number)
}

/// `{root}/issue-{volume}-{number}/{short_reference}`
pub fn article_dir(root: &Path, ctx: &ArticleContext, short_reference: &str) -> PathBuf {
    root.join(issue_dir_name(ctx)).join(short_reference)
}

/// Whether `path` has one of the file names that are never article content.
pub fn is_skipped(path: &Path, skip_names: &[String]) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            skip_names.iter().any(|skip| skip.as_str() == &*name)
        })
        .unwrap_or(false)
}
