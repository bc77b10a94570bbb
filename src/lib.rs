//! OAK Publisher
//!
//! Validation and static publishing for OAK (Open Agent Knowledge)
//! documents: the agent card, knowledge artifacts, and trust assertions an
//! agent publishes for other agents to read and cite.
//!
//! ## Features
//!
//! - **Schema Validation**: A small structural validator for the protocol's
//!   schema subset that reports every violation, with paths
//! - **Embedded Schemas**: The protocol schemas are compiled into the binary
//! - **Static Publishing**: Builds servable listing and detail endpoints
//!   from a source tree of JSON documents
//!
//! ## Architecture
//!
//! ```text
//! schemas/                      source/
//! ├── agent-card.schema.json    ├── card.json
//! ├── knowledge-artifact...     ├── knowledge/{date}/{slug}.json
//! └── trust-assertion...        └── trust/{agent}/{topic}.json
//!         │                              │
//!    Schema::compile               SiteBuilder::build
//!         │                              │
//!    validate() -> Vec<Violation>   site/oak/{card,knowledge,trust,services}
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod schema;
pub mod schema_set;
pub mod site;
pub mod validator;

pub use config::{OakConfig, OutputFormat};
pub use document::{read_document, DocumentKind};
pub use error::{OakError, Result};
pub use schema::{DeclaredType, JsonType, Schema, SchemaNode, Shape};
pub use schema_set::{embedded_schema, load_schema, SchemaSet};
pub use site::{BuildReport, SiteBuilder, SiteOptions};
pub use validator::{validate, Violation};
