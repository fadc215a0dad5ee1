use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::exchange::{header, parse_timestamp};
use crate::types::{CapturedExchange, DependencyGraph, GRAPH_VERSION, INFERRED_BY};

/// Errors returned when a [`CapturedExchange`] is not well formed.
///
/// Analysis tolerates every one of these; the lint exists for capture
/// producers that want to know what their output is losing.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("method must not be empty")]
    EmptyMethod,

    #[error("method must be an HTTP token, got: {0:?}")]
    InvalidMethod(String),

    #[error("url must be absolute or a path starting with '/', got: {0:?}")]
    InvalidUrl(String),

    #[error("url scheme must be http or https, got: {0:?}")]
    UnsupportedScheme(String),

    #[error("timestamp must be RFC 3339, got: {0:?}")]
    InvalidTimestamp(String),

    #[error("status must be 0 (no response) or 100-599, got {0}")]
    InvalidStatus(u16),

    #[error("{0} body declares a JSON content type but does not parse as JSON")]
    InvalidJsonBody(&'static str),
}

/// Lint one exchange. Returns the first problem found, in field order.
pub fn validate_exchange(exchange: &CapturedExchange) -> Result<(), ValidationError> {
    let method = exchange.method.trim();
    if method.is_empty() {
        return Err(ValidationError::EmptyMethod);
    }
    if !METHOD_RE.is_match(method) {
        return Err(ValidationError::InvalidMethod(exchange.method.clone()));
    }

    validate_url(exchange.url.trim())?;

    if let Some(ts) = &exchange.timestamp {
        parse_timestamp(ts).ok_or_else(|| ValidationError::InvalidTimestamp(ts.clone()))?;
    }

    if exchange.status != 0 && !(100..=599).contains(&exchange.status) {
        return Err(ValidationError::InvalidStatus(exchange.status));
    }

    if exchange.request_json.is_none()
        && declares_json(header(&exchange.request_headers, "content-type"))
        && !body_parses(exchange.request_body.as_deref())
    {
        return Err(ValidationError::InvalidJsonBody("request"));
    }
    if exchange.response_json.is_none()
        && declares_json(header(&exchange.response_headers, "content-type"))
        && !body_parses(exchange.response_body.as_deref())
    {
        return Err(ValidationError::InvalidJsonBody("response"));
    }

    Ok(())
}

/// Errors returned when a [`DependencyGraph`] document is inconsistent.
#[derive(Debug, Error, PartialEq)]
pub enum GraphValidationError {
    #[error("unsupported graph version {0}; expected {expected}", expected = GRAPH_VERSION)]
    UnsupportedVersion(u32),

    #[error("unknown inference strategy {0:?}; expected {expected:?}", expected = INFERRED_BY)]
    UnknownInferredBy(String),

    #[error("nodes must be sorted by key; {0:?} is out of order")]
    UnsortedNodes(String),

    #[error("duplicate node key {0:?}")]
    DuplicateNode(String),

    #[error("edge at index {0} references unknown node {1:?}")]
    UnknownNode(usize, String),

    #[error("edge at index {0} is a self-loop on {1:?}")]
    SelfLoop(usize, String),

    #[error("edge at index {0} has confidence {1}; must be in (0, 1]")]
    InvalidConfidence(usize, f64),

    #[error("meta.edges is {meta} but the graph has {actual} edges")]
    EdgeCountMismatch { meta: usize, actual: usize },
}

/// Check a graph document before handing it to a downstream consumer.
pub fn validate_graph(graph: &DependencyGraph) -> Result<(), GraphValidationError> {
    if graph.version != GRAPH_VERSION {
        return Err(GraphValidationError::UnsupportedVersion(graph.version));
    }
    if graph.meta.inferred_by != INFERRED_BY {
        return Err(GraphValidationError::UnknownInferredBy(
            graph.meta.inferred_by.clone(),
        ));
    }

    for pair in graph.nodes.windows(2) {
        match pair[0].key.cmp(&pair[1].key) {
            std::cmp::Ordering::Less => {}
            std::cmp::Ordering::Equal => {
                return Err(GraphValidationError::DuplicateNode(pair[1].key.clone()))
            }
            std::cmp::Ordering::Greater => {
                return Err(GraphValidationError::UnsortedNodes(pair[1].key.clone()))
            }
        }
    }

    for (i, edge) in graph.edges.iter().enumerate() {
        for end in [&edge.from, &edge.to] {
            if graph.node(end).is_none() {
                return Err(GraphValidationError::UnknownNode(i, end.clone()));
            }
        }
        if edge.from == edge.to {
            return Err(GraphValidationError::SelfLoop(i, edge.from.clone()));
        }
        if !(edge.confidence > 0.0 && edge.confidence <= 1.0) {
            return Err(GraphValidationError::InvalidConfidence(i, edge.confidence));
        }
    }

    if graph.meta.edges != graph.edges.len() {
        return Err(GraphValidationError::EdgeCountMismatch {
            meta: graph.meta.edges,
            actual: graph.edges.len(),
        });
    }

    Ok(())
}

/// Errors reading a trace document.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of exchanges or an object with an \"exchanges\" array")]
    NotATrace,
}

/// Parse a trace document: either a bare array of exchanges or an object
/// with an `exchanges` array.
pub fn parse_trace(text: &str) -> Result<Vec<CapturedExchange>, TraceError> {
    let value: Value = serde_json::from_str(text)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("exchanges") {
            Some(list @ Value::Array(_)) => list,
            _ => return Err(TraceError::NotATrace),
        },
        _ => return Err(TraceError::NotATrace),
    };
    Ok(serde_json::from_value(list)?)
}

// --- helpers -----------------------------------------------------------------

fn validate_url(raw: &str) -> Result<(), ValidationError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ValidationError::UnsupportedScheme(url.scheme().to_string())),
        Err(_) if raw.starts_with('/') => Ok(()),
        Err(_) => Err(ValidationError::InvalidUrl(raw.to_string())),
    }
}

fn declares_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let ct = ct.to_lowercase();
        ct.contains("application/json") || ct.contains("+json")
    })
}

fn body_parses(body: Option<&str>) -> bool {
    match body.map(str::trim) {
        None | Some("") => true,
        Some(text) => serde_json::from_str::<Value>(text).is_ok(),
    }
}

/// RFC 9110 `token`.
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[!#$%&'*+.^_`|~0-9A-Za-z-]+$").expect("invalid method regex")
});

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, DependencyEdge, GraphMeta, GraphNode};

    fn minimal() -> CapturedExchange {
        CapturedExchange::new("GET", "https://api.example.com/users/1")
    }

    #[test]
    fn valid_minimal_exchange() {
        assert!(validate_exchange(&minimal()).is_ok());
        assert!(validate_exchange(&CapturedExchange::new("get", "/relative?x=1")).is_ok());
    }

    #[test]
    fn bad_method() {
        let mut ex = minimal();
        ex.method = "  ".into();
        assert_eq!(validate_exchange(&ex), Err(ValidationError::EmptyMethod));
        ex.method = "GE T".into();
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::InvalidMethod("GE T".into()))
        );
    }

    #[test]
    fn bad_urls() {
        let ex = CapturedExchange::new("GET", "users/1");
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::InvalidUrl("users/1".into()))
        );
        let ex = CapturedExchange::new("GET", "wss://x.example.com/socket");
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::UnsupportedScheme("wss".into()))
        );
    }

    #[test]
    fn bad_timestamp_and_status() {
        let ex = minimal().with_timestamp("18/02/2026");
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::InvalidTimestamp("18/02/2026".into()))
        );
        assert!(validate_exchange(&minimal().with_status(0)).is_ok());
        assert_eq!(
            validate_exchange(&minimal().with_status(99)),
            Err(ValidationError::InvalidStatus(99))
        );
    }

    #[test]
    fn json_content_type_needs_json_body() {
        let mut ex = minimal().with_response_header("Content-Type", "application/json; charset=utf-8");
        ex.response_body = Some("<html>".into());
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::InvalidJsonBody("response"))
        );
        ex.response_body = Some(r#"{"ok": true}"#.into());
        assert!(validate_exchange(&ex).is_ok());

        let mut ex = minimal().with_request_header("content-type", "application/vnd.api+json");
        ex.request_body = Some("x=1".into());
        assert_eq!(
            validate_exchange(&ex),
            Err(ValidationError::InvalidJsonBody("request"))
        );
    }

    fn node(key: &str) -> GraphNode {
        let (method, path) = key.split_once(' ').unwrap();
        GraphNode {
            key: key.into(),
            method: method.into(),
            path: path.into(),
            category: Category::Read,
            calls: 1,
        }
    }

    fn edge(from: &str, to: &str, confidence: f64) -> DependencyEdge {
        DependencyEdge {
            from: from.into(),
            to: to.into(),
            artifacts: vec!["id".into()],
            evidence_count: 1,
            confidence,
            has_value_match: false,
        }
    }

    fn valid_graph() -> DependencyGraph {
        DependencyGraph {
            version: GRAPH_VERSION,
            nodes: vec![node("GET /items"), node("GET /items/{id}")],
            edges: vec![edge("GET /items", "GET /items/{id}", 0.18)],
            meta: GraphMeta {
                calls: 2,
                edges: 1,
                inferred_by: INFERRED_BY.into(),
            },
        }
    }

    #[test]
    fn valid_graphs() {
        assert!(validate_graph(&valid_graph()).is_ok());
        assert!(validate_graph(&DependencyGraph::empty()).is_ok());
    }

    #[test]
    fn graph_header_messages_name_the_expected_value() {
        assert_eq!(
            GraphValidationError::UnsupportedVersion(1).to_string(),
            format!("unsupported graph version 1; expected {GRAPH_VERSION}")
        );
        assert_eq!(
            GraphValidationError::UnknownInferredBy("manual".into()).to_string(),
            format!("unknown inference strategy \"manual\"; expected {INFERRED_BY:?}")
        );
    }

    #[test]
    fn graph_header_checks() {
        let mut g = valid_graph();
        g.version = 1;
        assert_eq!(validate_graph(&g), Err(GraphValidationError::UnsupportedVersion(1)));

        let mut g = valid_graph();
        g.meta.inferred_by = "manual".into();
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::UnknownInferredBy("manual".into()))
        );

        let mut g = valid_graph();
        g.meta.edges = 3;
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::EdgeCountMismatch { meta: 3, actual: 1 })
        );
    }

    #[test]
    fn graph_node_checks() {
        let mut g = valid_graph();
        g.nodes.reverse();
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::UnsortedNodes("GET /items".into()))
        );

        let mut g = valid_graph();
        g.nodes.push(node("GET /items/{id}"));
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::DuplicateNode("GET /items/{id}".into()))
        );
    }

    #[test]
    fn graph_edge_checks() {
        let mut g = valid_graph();
        g.edges[0].to = "GET /nowhere".into();
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::UnknownNode(0, "GET /nowhere".into()))
        );

        let mut g = valid_graph();
        g.edges[0].to = "GET /items".into();
        assert_eq!(
            validate_graph(&g),
            Err(GraphValidationError::SelfLoop(0, "GET /items".into()))
        );

        for bad in [0.0, 1.5, f64::NAN] {
            let mut g = valid_graph();
            g.edges[0].confidence = bad;
            assert!(matches!(
                validate_graph(&g),
                Err(GraphValidationError::InvalidConfidence(0, _))
            ));
        }
    }

    #[test]
    fn trace_documents() {
        let bare = r#"[{"method": "GET", "url": "/a"}]"#;
        assert_eq!(parse_trace(bare).unwrap().len(), 1);

        let wrapped = r#"{"exchanges": [{"method": "GET", "url": "/a"}, {"method": "POST", "url": "/b"}]}"#;
        assert_eq!(parse_trace(wrapped).unwrap().len(), 2);

        assert!(matches!(parse_trace("{}"), Err(TraceError::NotATrace)));
        assert!(matches!(parse_trace("42"), Err(TraceError::NotATrace)));
        assert!(matches!(parse_trace("[{"), Err(TraceError::Json(_))));
        assert!(matches!(parse_trace(r#"[{"url": "/a"}]"#), Err(TraceError::Json(_))));
    }
}
