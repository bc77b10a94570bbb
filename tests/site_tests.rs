//! Site Build Tests
//!
//! Builds the fixture source tree and checks the published endpoints.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use oak_publisher::{OutputFormat, SiteBuilder, SiteOptions};
use serde_json::{json, Value};
use tempfile::TempDir;

fn fixture_site() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/site")
}

fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn read(path: PathBuf) -> Value {
    serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap()
}

fn write_json(path: PathBuf, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn build_fixture() -> (TempDir, PathBuf) {
    let out = TempDir::new().unwrap();
    let site = out.path().join("site");
    SiteBuilder::default()
        .build_at(&fixture_site(), &site, fixed_now())
        .unwrap();
    (out, site.join("oak"))
}

// =============================================================================
// Knowledge
// =============================================================================

#[test]
fn test_knowledge_listing_newest_first() {
    let (_out, oak) = build_fixture();
    let listing = read(oak.join("knowledge/_index"));

    assert_eq!(listing["agent"], "test-agent");
    assert_eq!(listing["total"], 2);
    let ids: Vec<&str> = listing["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["test-agent/2026-02-02/second-artifact", "test-agent/2026-02-01/first-artifact"]
    );
}

#[test]
fn test_summaries_omit_content() {
    let (_out, oak) = build_fixture();
    let listing = read(oak.join("knowledge/_index"));
    let second = &listing["artifacts"][0];

    assert!(second.get("content").is_none());
    assert!(second.get("detail").is_none());
    assert_eq!(second["summary"], "This builds on the first.");
    assert_eq!(second["type"], "synthesis");
    assert_eq!(second["topics"], json!(["testing", "meta"]));
    assert_eq!(second["citationCount"], 1);
    assert_eq!(
        second["url"],
        "oak/knowledge/artifacts/test-agent/2026-02-02/second-artifact"
    );
    assert_eq!(listing["artifacts"][1]["citationCount"], 0);
}

#[test]
fn test_artifact_details_written_verbatim() {
    let (_out, oak) = build_fixture();
    let detail = read(oak.join("knowledge/artifacts/test-agent/2026-02-01/first-artifact"));
    let source = read(fixture_site().join("knowledge/2026-02-01/first-artifact.json"));
    assert_eq!(detail, source);
    assert_eq!(detail["content"]["detail"], "Full detail here.");
}

// =============================================================================
// Card
// =============================================================================

#[test]
fn test_card_stats_refreshed() {
    let (_out, oak) = build_fixture();
    let card = read(oak.join("card"));

    assert_eq!(card["name"], "test-agent");
    assert_eq!(card["oak"]["stats"]["artifactCount"], 2);
    assert_eq!(card["oak"]["stats"]["citedByCount"], 0);
    assert_eq!(card["oak"]["updatedAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(card["oak"]["createdAt"], "2026-02-01T00:00:00Z");
}

#[test]
fn test_card_untouched_when_refresh_disabled() {
    let out = TempDir::new().unwrap();
    let options = SiteOptions {
        refresh_card_stats: false,
        ..Default::default()
    };
    SiteBuilder::new(options)
        .build_at(&fixture_site(), out.path(), fixed_now())
        .unwrap();

    let card = read(out.path().join("oak/card"));
    assert_eq!(card, read(fixture_site().join("card.json")));
}

// =============================================================================
// Trust and Services
// =============================================================================

#[test]
fn test_trust_listing() {
    let (_out, oak) = build_fixture();
    let listing = read(oak.join("trust/_index"));

    assert_eq!(listing["agent"], "test-agent");
    assert_eq!(listing["received"], json!([]));
    assert_eq!(
        listing["given"],
        json!([{
            "to": "other-agent",
            "topic": "testing",
            "level": 0.7,
            "url": "oak/trust/assertions/other-agent/testing"
        }])
    );

    let detail = read(oak.join("trust/assertions/other-agent/testing"));
    assert_eq!(detail["reason"], "Reliable test data");
}

#[test]
fn test_services_tagged_with_source() {
    let (_out, oak) = build_fixture();
    let services = read(oak.join("services"));

    assert_eq!(services["agent"], "test-agent");
    assert_eq!(
        services["services"],
        json!([{
            "name": "test-runner",
            "endpoint": "https://test.example.com/a2a",
            "sourceArtifact": "test-agent/2026-02-02/second-artifact"
        }])
    );
}

#[test]
fn test_report_counts() {
    let out = TempDir::new().unwrap();
    let report = SiteBuilder::default()
        .build_at(&fixture_site(), out.path(), fixed_now())
        .unwrap();

    assert_eq!(report.card.as_deref(), Some("test-agent"));
    assert_eq!(report.artifacts, 2);
    assert_eq!(report.assertions, 1);
    assert_eq!(report.services, 1);
    assert!(report.skipped.is_empty());
    assert!(report.warnings.is_empty());
}

// =============================================================================
// Degraded Sources
// =============================================================================

#[test]
fn test_empty_source() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let report = SiteBuilder::default().build(source.path(), out.path()).unwrap();

    assert!(report.card.is_none());
    assert_eq!(report.warnings.len(), 1);
    assert!(!out.path().join("oak/card").exists());

    let knowledge = read(out.path().join("oak/knowledge/_index"));
    assert_eq!(knowledge, json!({ "agent": "unknown", "total": 0, "artifacts": [] }));

    let trust = read(out.path().join("oak/trust/_index"));
    assert_eq!(trust, json!({ "agent": "unknown", "given": [], "received": [] }));

    let services = read(out.path().join("oak/services"));
    assert_eq!(services, json!({ "agent": "unknown", "services": [] }));
}

#[test]
fn test_invalid_json_skipped() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_json(
        source.path().join("knowledge/2026-02-01/good.json"),
        &json!({
            "id": "a/2026-02-01/good",
            "created": "2026-02-01T00:00:00Z",
            "content": { "summary": "ok" }
        }),
    );
    fs::write(source.path().join("knowledge/2026-02-01/broken.json"), "{ not json").unwrap();

    let report = SiteBuilder::default().build(source.path(), out.path()).unwrap();

    assert_eq!(report.artifacts, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("broken.json"));
    assert!(out.path().join("oak/knowledge/artifacts/a/2026-02-01/good").is_file());
}

#[test]
fn test_unsafe_id_not_written() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_json(
        source.path().join("knowledge/2026-02-01/escape.json"),
        &json!({ "id": "../escape", "content": { "summary": "nope" } }),
    );

    let report = SiteBuilder::default().build(source.path(), out.path()).unwrap();

    assert_eq!(report.artifacts, 1);
    assert!(report.warnings.iter().any(|w| w.contains("../escape")));
    assert!(!out.path().join("oak/knowledge/escape").exists());
    let listing = read(out.path().join("oak/knowledge/_index"));
    assert_eq!(listing["total"], 1);
}

#[test]
fn test_undated_artifacts_sort_last() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_json(
        source.path().join("knowledge/a.json"),
        &json!({ "id": "x/undated/a" }),
    );
    write_json(
        source.path().join("knowledge/b.json"),
        &json!({ "id": "x/2026-01-01/b", "created": "2026-01-01T00:00:00Z" }),
    );

    SiteBuilder::default().build(source.path(), out.path()).unwrap();

    let listing = read(out.path().join("oak/knowledge/_index"));
    assert_eq!(listing["artifacts"][0]["id"], "x/2026-01-01/b");
    assert_eq!(listing["artifacts"][1]["id"], "x/undated/a");
    assert_eq!(listing["artifacts"][1]["summary"], "");
}

#[test]
fn test_compact_output() {
    let out = TempDir::new().unwrap();
    let options = SiteOptions {
        output_format: OutputFormat::Compact,
        ..Default::default()
    };
    SiteBuilder::new(options)
        .build_at(&fixture_site(), out.path(), fixed_now())
        .unwrap();

    let raw = fs::read_to_string(out.path().join("oak/services")).unwrap();
    assert!(!raw.contains('\n'));
    assert!(raw.starts_with(r#"{"agent":"test-agent""#));
}

#[test]
fn test_date_only_created_sorts_by_date() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_json(
        source.path().join("knowledge/2026-02-01/old.json"),
        &json!({ "id": "a/2026-02-01/old", "created": "2026-02-01T00:00:00Z" }),
    );
    write_json(
        source.path().join("knowledge/2026-02-03/new.json"),
        &json!({ "id": "a/2026-02-03/new", "created": "2026-02-03" }),
    );
    write_json(
        source.path().join("knowledge/2026-02-02/mid.json"),
        &json!({ "id": "a/2026-02-02/mid", "created": "2026-02-02T08:30:00" }),
    );

    SiteBuilder::default().build(source.path(), out.path()).unwrap();

    let listing = read(out.path().join("oak/knowledge/_index"));
    let ids: Vec<&str> = listing["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a/2026-02-03/new", "a/2026-02-02/mid", "a/2026-02-01/old"]);
}

#[test]
fn test_overlapping_detail_paths_do_not_abort() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let assertion = |to: &str, topic: &str| {
        json!({ "to": { "name": to }, "topic": topic, "level": 0.5 })
    };
    write_json(source.path().join("trust/1.json"), &assertion("a", "b"));
    write_json(source.path().join("trust/2.json"), &assertion("a/b", "c"));
    write_json(source.path().join("knowledge/1.json"), &json!({ "id": "x/y" }));
    write_json(
        source.path().join("knowledge/2.json"),
        &json!({
            "id": "x/y/z",
            "services": [{ "name": "svc", "endpoint": "https://svc.example.com" }]
        }),
    );

    let report = SiteBuilder::default().build(source.path(), out.path()).unwrap();

    assert_eq!(report.artifacts, 2);
    assert_eq!(report.assertions, 2);
    assert_eq!(report.services, 1);
    assert!(report.warnings.iter().any(|w| w.starts_with("Not writing trust assertion")));
    assert!(report.warnings.iter().any(|w| w.starts_with("Not writing artifact detail")));

    assert!(out.path().join("oak/trust/assertions/a/b").is_file());
    let trust = read(out.path().join("oak/trust/_index"));
    assert_eq!(trust["given"].as_array().unwrap().len(), 2);
    let services = read(out.path().join("oak/services"));
    assert_eq!(services["services"][0]["sourceArtifact"], "x/y/z");
}

#[test]
fn test_empty_card_name_is_unknown_agent() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_json(source.path().join("card.json"), &json!({ "name": "" }));

    let report = SiteBuilder::default().build(source.path(), out.path()).unwrap();

    assert_eq!(report.card.as_deref(), Some("unknown"));
    let listing = read(out.path().join("oak/knowledge/_index"));
    assert_eq!(listing["agent"], "unknown");
}
