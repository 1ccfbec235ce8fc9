//! Shared builders for unit tests.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let json = record_json(vec![paragraph(1, "Hello"), paragraph(2, "World")]);
//! let record = ContentRecord::from_json(&json).unwrap();
//! let article = Article::from_record(&record, &test_config()).unwrap();
//! ```

use crate::config::RenderConfig;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

// =========================================================================
// Records
// =========================================================================

/// A content record with fixed metadata around the given elements.
///
/// Title `Test Article`, short reference `test-article`, position 3, no
/// chapter and no supernotes.
pub fn record_json(content: Vec<Value>) -> String {
    json!({
        "metadata": {
            "title": "Test Article",
            "author": ["Test Author"],
            "short-reference": "test-article",
            "position": 3,
        },
        "content": content,
    })
    .to_string()
}

/// A plain paragraph element.
pub fn paragraph(number: u32, text: &str) -> Value {
    json!({"type": "paragraph", "number": number, "content": text})
}

pub fn test_config() -> RenderConfig {
    RenderConfig::default()
}

/// Write `json` to `dir/name` and return the path.
pub fn write_record(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, json).unwrap();
    path
}
