//! Loading the protocol schemas
//!
//! Schemas come from a schema directory on disk (`agent-card.schema.json`,
//! `knowledge-artifact.schema.json`, `trust-assertion.schema.json`) or
//! from the copies compiled into the binary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use serde_json::Value;
use tracing::debug;

use crate::document::DocumentKind;
use crate::error::{OakError, Result};
use crate::schema::Schema;
use crate::validator::{validate, Violation};

/// Protocol schemas shipped with the crate
pub static EMBEDDED_SCHEMAS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// Path of the schema file for `kind` inside `schema_dir`
pub fn schema_path(schema_dir: &Path, kind: DocumentKind) -> PathBuf {
    schema_dir.join(kind.schema_file())
}

/// Load and compile the schema for one document kind from a directory
pub fn load_schema(schema_dir: &Path, kind: DocumentKind) -> Result<Schema> {
    let path = schema_path(schema_dir, kind);
    if !path.is_file() {
        return Err(OakError::SchemaNotFound { path });
    }
    debug!(kind = %kind, path = %path.display(), "loading schema");

    let content = fs::read_to_string(&path)?;
    let raw: Value = serde_json::from_str(&content).map_err(|source| OakError::Parse {
        path: path.clone(),
        source,
    })?;
    Schema::compile(&raw)
}

/// Compile the embedded schema for one document kind
pub fn embedded_schema(kind: DocumentKind) -> Result<Schema> {
    let file = EMBEDDED_SCHEMAS
        .get_file(kind.schema_file())
        .ok_or_else(|| OakError::SchemaNotFound {
            path: PathBuf::from(kind.schema_file()),
        })?;
    let content = file.contents_utf8().ok_or_else(|| {
        OakError::invalid_schema(kind.schema_file(), "embedded schema is not UTF-8")
    })?;
    let raw: Value = serde_json::from_str(content).map_err(|source| OakError::Parse {
        path: PathBuf::from(kind.schema_file()),
        source,
    })?;
    Schema::compile(&raw)
}

/// All three protocol schemas, compiled
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: HashMap<DocumentKind, Schema>,
}

impl SchemaSet {
    /// Load every schema from a directory; fails if any is missing
    pub fn from_directory(schema_dir: &Path) -> Result<Self> {
        let mut schemas = HashMap::new();
        for kind in DocumentKind::ALL {
            schemas.insert(kind, load_schema(schema_dir, kind)?);
        }
        Ok(Self { schemas })
    }

    /// The schemas compiled into the binary
    pub fn embedded() -> Result<Self> {
        let mut schemas = HashMap::new();
        for kind in DocumentKind::ALL {
            schemas.insert(kind, embedded_schema(kind)?);
        }
        Ok(Self { schemas })
    }

    pub fn get(&self, kind: DocumentKind) -> &Schema {
        // Both constructors fill every kind
        &self.schemas[&kind]
    }

    /// Validate a document of the given kind, rooting paths at the kind name
    pub fn validate(&self, kind: DocumentKind, document: &Value) -> Vec<Violation> {
        validate(self.get(kind), document, kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_embedded_schemas_compile() {
        let set = SchemaSet::embedded().unwrap();
        for kind in DocumentKind::ALL {
            assert!(!set.get(kind).root.required.is_empty(), "{kind} has no required fields");
        }
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = tempdir().unwrap();
        match load_schema(dir.path(), DocumentKind::Trust) {
            Err(OakError::SchemaNotFound { path }) => {
                assert!(path.ends_with("trust-assertion.schema.json"))
            }
            other => panic!("Expected SchemaNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_schema_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("agent-card.schema.json"), "{ not json").unwrap();
        assert!(matches!(
            load_schema(dir.path(), DocumentKind::Card),
            Err(OakError::Parse { .. })
        ));
    }

    #[test]
    fn test_directory_matches_embedded() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("schemas");
        let set = SchemaSet::from_directory(&dir).unwrap();
        let doc = serde_json::json!({ "name": "agent" });
        assert_eq!(
            set.validate(DocumentKind::Card, &doc),
            SchemaSet::embedded().unwrap().validate(DocumentKind::Card, &doc)
        );
    }
}
