//! Collect-and-continue JSON tree walking
//!
//! A malformed file is a data defect, not a failure: it is recorded in
//! [`WalkOutcome::skipped`] and the walk carries on.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;
use walkdir::WalkDir;

/// A parsed JSON file and where it came from
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub value: Value,
}

/// A file left out of the build, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<SkippedFile>,
}

impl WalkOutcome {
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.documents.iter().map(|d| &d.value)
    }
}

/// Parse every `*.json` file below `dir`, in file-name order.
///
/// Symlinks are followed. A missing directory yields an empty outcome.
pub fn collect_json(dir: &Path) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    if !dir.is_dir() {
        return outcome;
    }

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                outcome.skipped.push(SkippedFile { path, reason: e.to_string() });
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(value) => outcome.documents.push(SourceDocument {
                path: path.to_path_buf(),
                value,
            }),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "skipping invalid JSON");
                outcome.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }

    outcome
}
