//! Listing resources served next to the individual documents

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `oak/knowledge/_index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeListing {
    pub agent: String,
    pub total: usize,
    pub artifacts: Vec<ArtifactSummary>,
}

/// Summary-level view of an artifact. Never carries `content` or its
/// detail body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    pub summary: String,
    pub citation_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ArtifactSummary {
    pub fn from_artifact(artifact: &Value) -> Self {
        let field = |name: &str| artifact.get(name).cloned();
        let summary = artifact
            .pointer("/content/summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let citation_count = artifact
            .get("citations")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        Self {
            id: field("id"),
            kind: field("type"),
            title: field("title"),
            topics: field("topics"),
            created: field("created"),
            summary,
            citation_count,
            url: artifact_id(artifact).map(|id| format!("oak/knowledge/artifacts/{id}")),
        }
    }
}

/// `oak/trust/_index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustListing {
    pub agent: String,
    pub given: Vec<TrustEntry>,
    /// Assertions other agents made about this one; not tracked locally
    pub received: Vec<TrustEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TrustEntry {
    pub fn from_assertion(assertion: &Value) -> Self {
        let url = assertion_target(assertion)
            .map(|(to, topic)| format!("oak/trust/assertions/{to}/{topic}"));
        Self {
            to: assertion.pointer("/to/name").cloned(),
            topic: assertion.get("topic").cloned(),
            level: assertion.get("level").cloned(),
            url,
        }
    }
}

/// `oak/services`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesListing {
    pub agent: String,
    pub services: Vec<Value>,
}

/// Flatten the `services` declared by each artifact, tagging every entry
/// with the artifact it came from. Non-object entries are dropped.
pub fn collect_services<'a>(artifacts: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
    let mut services = Vec::new();
    for artifact in artifacts {
        let Some(declared) = artifact.get("services").and_then(Value::as_array) else {
            continue;
        };
        let source = artifact.get("id").cloned().unwrap_or(Value::Null);
        for service in declared {
            if let Value::Object(fields) = service {
                let mut entry = fields.clone();
                entry.insert("sourceArtifact".to_string(), source.clone());
                services.push(Value::Object(entry));
            }
        }
    }
    services
}

pub(crate) fn artifact_id(artifact: &Value) -> Option<&str> {
    artifact.get("id").and_then(Value::as_str)
}

/// `(to.name, topic)` of a trust assertion
pub(crate) fn assertion_target(assertion: &Value) -> Option<(&str, &str)> {
    let to = assertion.pointer("/to/name").and_then(Value::as_str)?;
    let topic = assertion.get("topic").and_then(Value::as_str)?;
    Some((to, topic))
}
