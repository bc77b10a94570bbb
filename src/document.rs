//! OAK document kinds

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OakError, Result};

/// The three document types published by an OAK agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Agent card (`card.json`)
    Card,
    /// Knowledge artifact (`knowledge/{date}/{slug}.json`)
    Knowledge,
    /// Trust assertion (`trust/{agent}/{topic}.json`)
    Trust,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Card, Self::Knowledge, Self::Trust];

    /// Name used on the command line and as the root of violation paths
    pub fn name(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Knowledge => "knowledge",
            Self::Trust => "trust",
        }
    }

    /// File name of the schema describing this kind
    pub fn schema_file(&self) -> &'static str {
        match self {
            Self::Card => "agent-card.schema.json",
            Self::Knowledge => "knowledge-artifact.schema.json",
            Self::Trust => "trust-assertion.schema.json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentKind {
    type Err = OakError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| OakError::UnknownKind(s.to_string()))
    }
}

/// Read and parse a JSON document
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(OakError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| OakError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
