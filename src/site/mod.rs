//! Static Site Assembly
//!
//! Turns an agent's source tree into servable OAK endpoints.
//!
//! ```text
//! source/                          output/
//! ├── card.json                    └── oak/
//! ├── knowledge/{date}/{slug}.json     ├── card
//! └── trust/{agent}/{topic}.json       ├── knowledge/_index
//!                                      ├── knowledge/artifacts/{id}
//!                                      ├── trust/_index
//!                                      ├── trust/assertions/{agent}/{topic}
//!                                      └── services
//! ```
//!
//! Schemas are not consulted here; validation is a separate step.

pub mod listing;
pub mod walk;

pub use listing::{
    collect_services, ArtifactSummary, KnowledgeListing, ServicesListing, TrustEntry, TrustListing,
};
pub use walk::{collect_json, SkippedFile, SourceDocument, WalkOutcome};

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::OutputFormat;
use crate::error::{OakError, Result};
use listing::{artifact_id, assertion_target};

/// Agent name used when no card is available
pub const UNKNOWN_AGENT: &str = "unknown";

/// Options for a site build
#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub output_format: OutputFormat,
    /// Refresh `oak.stats.artifactCount` and `oak.updatedAt` on the card
    pub refresh_card_stats: bool,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Pretty,
            refresh_card_stats: true,
        }
    }
}

/// What a build produced
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Agent name, when a card was published
    pub card: Option<String>,
    pub artifacts: usize,
    pub assertions: usize,
    pub services: usize,
    /// Source files that could not be parsed
    pub skipped: Vec<SkippedFile>,
    /// Non-fatal problems (missing card, unsafe ids, ...)
    pub warnings: Vec<String>,
}

impl BuildReport {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Assembles the static OAK site
#[derive(Debug, Clone, Default)]
pub struct SiteBuilder {
    options: SiteOptions,
}

impl SiteBuilder {
    pub fn new(options: SiteOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, source: &Path, output: &Path) -> Result<BuildReport> {
        self.build_at(source, output, Utc::now())
    }

    /// Build with an explicit timestamp for the card's `updatedAt`
    pub fn build_at(&self, source: &Path, output: &Path, now: DateTime<Utc>) -> Result<BuildReport> {
        info!(source = %source.display(), output = %output.display(), "building OAK site");
        let mut report = BuildReport {
            output_dir: output.to_path_buf(),
            ..Default::default()
        };
        let oak_dir = output.join("oak");

        let knowledge = collect_json(&source.join("knowledge"));
        let trust = collect_json(&source.join("trust"));
        report.skipped.extend(knowledge.skipped.iter().cloned());
        report.skipped.extend(trust.skipped.iter().cloned());

        let mut artifacts: Vec<&Value> = knowledge.values().collect();
        // Newest first; stable, unparseable timestamps last
        artifacts.sort_by(|a, b| created_at(b).cmp(&created_at(a)));

        // 1. Agent card
        let card = self.load_card(source, &mut report);
        let agent = card
            .as_ref()
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AGENT)
            .to_string();

        if let Some(mut card) = card {
            if self.options.refresh_card_stats {
                refresh_card(&mut card, artifacts.len(), now);
            }
            self.write(&oak_dir.join("card"), &card)?;
            info!(agent = %agent, "card written");
            report.card = Some(agent.clone());
        }

        // 2. Knowledge listing and artifacts
        let listing = KnowledgeListing {
            agent: agent.clone(),
            total: artifacts.len(),
            artifacts: artifacts.iter().map(|a| ArtifactSummary::from_artifact(a)).collect(),
        };
        self.write(&oak_dir.join("knowledge").join("_index"), &listing)?;

        let artifacts_dir = oak_dir.join("knowledge").join("artifacts");
        for artifact in &artifacts {
            match artifact_id(artifact).map(relative_path) {
                Some(Ok(rel)) => {
                    let path = artifacts_dir.join(rel);
                    if let Err(e) = self.write(&path, artifact) {
                        report.warn(format!("Not writing artifact detail {}: {e}", path.display()));
                    }
                }
                Some(Err(e)) => report.warn(format!("Not writing artifact detail: {e}")),
                None => report.warn("Not writing artifact detail: artifact has no id".to_string()),
            }
        }
        report.artifacts = artifacts.len();
        info!(count = report.artifacts, "knowledge listing written");

        // 3. Trust listing and assertions
        let assertions: Vec<&Value> = trust.values().collect();
        let trust_listing = TrustListing {
            agent: agent.clone(),
            given: assertions.iter().map(|t| TrustEntry::from_assertion(t)).collect(),
            received: Vec::new(),
        };
        self.write(&oak_dir.join("trust").join("_index"), &trust_listing)?;

        let assertions_dir = oak_dir.join("trust").join("assertions");
        for assertion in &assertions {
            let target = assertion_target(assertion).map(|(to, topic)| {
                relative_path(to).and_then(|dir| relative_path(topic).map(|file| dir.join(file)))
            });
            match target {
                Some(Ok(rel)) => {
                    let path = assertions_dir.join(rel);
                    if let Err(e) = self.write(&path, assertion) {
                        report.warn(format!("Not writing trust assertion {}: {e}", path.display()));
                    }
                }
                Some(Err(e)) => report.warn(format!("Not writing trust assertion: {e}")),
                None => report.warn("Not writing trust assertion: missing to.name or topic".to_string()),
            }
        }
        report.assertions = assertions.len();
        info!(count = report.assertions, "trust listing written");

        // 4. Services
        let services = collect_services(artifacts.iter().copied());
        report.services = services.len();
        self.write(&oak_dir.join("services"), &ServicesListing { agent, services })?;
        info!(count = report.services, "services written");

        Ok(report)
    }

    fn load_card(&self, source: &Path, report: &mut BuildReport) -> Option<Value> {
        let card_path = source.join("card.json");
        if !card_path.is_file() {
            report.warn("No card.json found, skipping card endpoint".to_string());
            return None;
        }

        let parsed = fs::read_to_string(&card_path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(card) => Some(card),
            Err(reason) => {
                warn!(path = %card_path.display(), %reason, "skipping invalid card");
                report.skipped.push(SkippedFile { path: card_path, reason });
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = match self.options.output_format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        fs::write(path, content)?;
        Ok(())
    }
}

/// Parse `created` as RFC 3339, then as a date-time without offset, then as a
/// bare date. Values without an offset are read as UTC.
fn created_at(artifact: &Value) -> Option<DateTime<Utc>> {
    let text = artifact.get("created").and_then(Value::as_str)?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Set `oak.stats.artifactCount` (when stats exist) and `oak.updatedAt`
fn refresh_card(card: &mut Value, artifact_count: usize, now: DateTime<Utc>) {
    let Some(oak) = card.get_mut("oak").and_then(Value::as_object_mut) else {
        return;
    };
    if let Some(stats) = oak.get_mut("stats").and_then(Value::as_object_mut) {
        stats.insert("artifactCount".to_string(), Value::from(artifact_count));
    }
    oak.insert(
        "updatedAt".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
}

/// Turn an id like `agent/2026-02-01/slug` into a relative path, refusing
/// anything that could escape the output directory.
fn relative_path(id: &str) -> Result<PathBuf> {
    let path = Path::new(id);
    let safe = !id.is_empty()
        && !id.contains('\\')
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(OakError::UnsafePath(id.to_string()))
    }
}
