//! Core data types for the traffic-analysis pipeline.
//!
//! Input records ([`CapturedExchange`]) come from a capture layer and are
//! only ever borrowed. Everything else here is derived output: route
//! templates, endpoint groups, and the dependency graph. Output types
//! serialise with `camelCase` field names; that JSON shape is the contract
//! with code generators and workflow learners.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::SchemaNode;

/// Version stamped on every serialised [`DependencyGraph`].
pub const GRAPH_VERSION: u32 = 2;

/// Name of the inference strategy recorded in [`GraphMeta::inferred_by`].
pub const INFERRED_BY: &str = "heuristic-v2";

// --- input -------------------------------------------------------------------

/// One observed request/response pair.
///
/// Only `method` and `url` are required. Bodies may be supplied as raw text,
/// as already-parsed JSON, or both; the parsed form wins when present.
/// Malformed bodies are treated as absent, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CapturedExchange {
    /// HTTP method as captured (case is normalised during analysis).
    pub method: String,

    /// Absolute URL, or a path-and-query relative to the captured origin.
    pub url: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_cookies: BTreeMap<String, String>,

    /// Raw request body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,

    /// Request body parsed as JSON by the capture layer, if it managed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_json: Option<Value>,

    /// Response status code. `0` when the capture never saw a response.
    #[serde(default)]
    pub status: u16,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json: Option<Value>,

    /// RFC 3339 capture time. Absent timestamps fall back to trace position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl CapturedExchange {
    /// A bare exchange with a `200` status and nothing else captured.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status: 200,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_response_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.response_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_request_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_request_json(mut self, body: Value) -> Self {
        self.request_json = Some(body);
        self
    }

    pub fn with_response_json(mut self, body: Value) -> Self {
        self.response_json = Some(body);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

// --- classification ------------------------------------------------------------

/// The broad purpose of an endpoint group.
///
/// The declaration order is the tie-break order used by the ordering pass:
/// `auth < read < write < delete < other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Login, token issue/refresh, registration, session management.
    Auth,
    /// `GET`, `HEAD`, `OPTIONS`.
    Read,
    /// `POST`, `PUT`, `PATCH`.
    Write,
    /// `DELETE`.
    Delete,
    /// Anything else.
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Auth => write!(f, "auth"),
            Category::Read => write!(f, "read"),
            Category::Write => write!(f, "write"),
            Category::Delete => write!(f, "delete"),
            Category::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Category::Auth),
            "read" => Ok(Category::Read),
            "write" => Ok(Category::Write),
            "delete" => Ok(Category::Delete),
            "other" => Ok(Category::Other),
            _ => Err(format!(
                "unknown category {:?}; expected one of: auth, read, write, delete, other",
                s
            )),
        }
    }
}

/// Inferred type of a wildcarded path segment or query value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Uuid,
    /// Hex string of 16 or more characters.
    Hash,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Uuid => write!(f, "uuid"),
            ParamType::Hash => write!(f, "hash"),
        }
    }
}

impl std::str::FromStr for ParamType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParamType::String),
            "integer" => Ok(ParamType::Integer),
            "uuid" => Ok(ParamType::Uuid),
            "hash" => Ok(ParamType::Hash),
            _ => Err(format!(
                "unknown param type {:?}; expected one of: string, integer, uuid, hash",
                s
            )),
        }
    }
}

// --- routes ------------------------------------------------------------------

/// A named placeholder in a [`RouteTemplate`], with one example value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteParam {
    pub name: String,
    pub example: String,
    pub param_type: ParamType,
}

/// A generalised path such as `/users/{userId}/orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTemplate {
    pub path: String,
    /// Placeholders in path order.
    pub params: Vec<RouteParam>,
}

// --- endpoint groups -----------------------------------------------------------

/// Aggregated view of one query parameter across a group's exchanges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryParam {
    pub name: String,
    /// First value seen.
    pub example: String,
    pub param_type: ParamType,
    /// Number of exchanges in the group that carried this parameter.
    pub occurrences: usize,
    /// Seen in at least the configured share (80% by default) of exchanges.
    pub required: bool,
}

/// One concrete shape of a generalised route: the same method and template
/// but a distinct query-key set or request body shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointVariant {
    pub fingerprint: String,
    pub query_keys: Vec<String>,
    pub body_signature: String,
    pub count: usize,
}

/// One logical route + method, built by folding every matching exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroup {
    /// Stable identifier, e.g. `"GET /users/{id}"`. Graph nodes and
    /// dependency sets refer to groups by this key.
    pub key: String,
    pub method: String,
    pub normalized_path: String,
    /// GraphQL operation name for persisted-query style traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub category: Category,
    pub description: String,
    /// Basic fingerprint (method + path only); always computable.
    pub fingerprint: String,
    pub path_params: Vec<RouteParam>,
    pub query_params: Vec<QueryParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body_schema: Option<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body_schema: Option<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_summary: Option<String>,
    pub status_codes: BTreeSet<u16>,
    /// Identifier-like response fields, as dotted paths (`items[].id`).
    pub produces: BTreeSet<String>,
    /// Path parameters plus identifier-like query and request-body fields.
    pub consumes: BTreeSet<String>,
    /// Keys of groups this one needs to run after.
    pub dependencies: BTreeSet<String>,
    pub variants: Vec<EndpointVariant>,
    pub example_count: usize,
}

// --- dependency graph ------------------------------------------------------------

/// A named datum observed at one call site. Raw values are never kept; only
/// a hash, and only for primitives that survive the noise filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Dotted location such as `body.user.id`, `query.projectId`, or
    /// `header.authorization`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_hash: Option<String>,
}

/// Summary of an endpoint group as it appears in a [`DependencyGraph`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub key: String,
    pub method: String,
    pub path: String,
    pub category: Category,
    /// Calls in the trace that resolved to this node.
    pub calls: usize,
}

/// "`from`'s output is used as `to`'s input."
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    /// Human-readable evidence: `"body.token -> header.authorization"` for
    /// value matches, a bare field name for name-only matches.
    pub artifacts: Vec<String>,
    pub evidence_count: usize,
    pub confidence: f64,
    pub has_value_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphMeta {
    pub calls: usize,
    pub edges: usize,
    pub inferred_by: String,
}

/// Inferred producer/consumer graph over one trace. Built fresh per run and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyGraph {
    pub version: u32,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<DependencyEdge>,
    pub meta: GraphMeta,
}

impl DependencyGraph {
    /// The graph of an empty trace.
    pub fn empty() -> Self {
        Self {
            version: GRAPH_VERSION,
            nodes: Vec::new(),
            edges: Vec::new(),
            meta: GraphMeta {
                calls: 0,
                edges: 0,
                inferred_by: INFERRED_BY.into(),
            },
        }
    }

    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&DependencyEdge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Edges whose `to` is `key`: what this node needs first.
    pub fn incoming(&self, key: &str) -> Vec<&DependencyEdge> {
        self.edges.iter().filter(|e| e.to == key).collect()
    }

    /// Edges whose `from` is `key`: what this node feeds.
    pub fn outgoing(&self, key: &str) -> Vec<&DependencyEdge> {
        self.edges.iter().filter(|e| e.from == key).collect()
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_strings() {
        for c in [
            Category::Auth,
            Category::Read,
            Category::Write,
            Category::Delete,
            Category::Other,
        ] {
            assert_eq!(c.to_string().parse::<Category>(), Ok(c));
        }
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn param_type_round_trips_through_strings() {
        for t in [
            ParamType::String,
            ParamType::Integer,
            ParamType::Uuid,
            ParamType::Hash,
        ] {
            assert_eq!(t.to_string().parse::<ParamType>(), Ok(t));
            assert_eq!(serde_json::to_value(t).unwrap(), serde_json::json!(t.to_string()));
        }
        assert!("Integer".parse::<ParamType>().is_err());
    }

    #[test]
    fn category_order_matches_tie_break_order() {
        assert!(Category::Auth < Category::Read);
        assert!(Category::Read < Category::Write);
        assert!(Category::Write < Category::Delete);
        assert!(Category::Delete < Category::Other);
    }

    #[test]
    fn exchange_deserialises_with_only_method_and_url() {
        let json = r#"{ "method": "GET", "url": "https://api.example.com/me" }"#;
        let ex: CapturedExchange = serde_json::from_str(json).unwrap();
        assert_eq!(ex.method, "GET");
        assert_eq!(ex.status, 0);
        assert!(ex.response_json.is_none());
    }

    #[test]
    fn empty_graph_serialises_with_version_and_meta() {
        let v = serde_json::to_value(DependencyGraph::empty()).unwrap();
        assert_eq!(v["version"], 2);
        assert_eq!(v["nodes"], serde_json::json!([]));
        assert_eq!(v["meta"]["calls"], 0);
        assert_eq!(v["meta"]["inferredBy"], "heuristic-v2");
    }
}
