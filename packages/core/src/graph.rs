//! Cross-call dependency inference.
//!
//! Each call in a trace yields two artifact sets: what its response
//! *produces* and what its request *consumes*. For every ordered pair of
//! calls `(a, b)` with `a` earlier than `b`, a value hash produced by `a` and
//! consumed by `b` is a strong match: a value observably flowed from one
//! response into a later request. When a pair has no strong match, shared
//! field names count as weak evidence instead. Pair evidence accumulates
//! into one edge per `(from, to)` group pair.
//!
//! Raw values never leave this module; artifacts carry SHA-256 hashes only,
//! and only for primitives that survive [`hash_primitive`]'s noise filter.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::auth::strip_auth_scheme;
use crate::config::AnalysisConfig;
use crate::exchange::{header, ParsedExchange};
use crate::filters::{is_auth_like_header, leaf_name};
use crate::types::{
    Artifact, DependencyEdge, DependencyGraph, EndpointGroup, GraphMeta, GraphNode, RouteTemplate,
    GRAPH_VERSION, INFERRED_BY,
};

/// Strings longer than this are fingerprinted by length and prefix.
const LONG_STRING: usize = 512;
const LONG_PREFIX: usize = 64;

// --- hashing -------------------------------------------------------------------

/// Hash a primitive for value matching, or `None` when the value is too
/// common to mean anything.
///
/// - strings are trimmed; empty and single-character strings are skipped
/// - strings over 512 characters hash as `len:{n}:{first 64 chars}`
/// - booleans and nulls are skipped
/// - integers in `-3..=3` are skipped
/// - other numbers hash as their decimal string, so `42` in a body and
///   `"42"` in a path match
pub fn hash_primitive(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => hash_str(s),
        Value::Number(n) => {
            let decimal = if let Some(i) = n.as_i64() {
                if i.unsigned_abs() <= 3 {
                    return None;
                }
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    if f.abs() <= 3.0 {
                        return None;
                    }
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            };
            Some(sha256_hex(&decimal))
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn hash_str(raw: &str) -> Option<String> {
    let s = raw.trim();
    let len = s.chars().count();
    if len <= 1 {
        return None;
    }
    if len > LONG_STRING {
        let prefix: String = s.chars().take(LONG_PREFIX).collect();
        return Some(sha256_hex(&format!("len:{len}:{prefix}")));
    }
    Some(sha256_hex(s))
}

fn sha256_hex(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

/// Edge confidence from strong and weak match totals, rounded to two
/// decimals. `0.0` means no edge.
pub fn edge_confidence(strong: usize, weak: usize) -> f64 {
    let raw = if strong > 0 {
        (0.65 + 0.08 * strong.min(4) as f64).min(0.95)
    } else if weak >= 2 {
        0.25
    } else if weak == 1 {
        0.18
    } else {
        0.0
    };
    (raw * 100.0).round() / 100.0
}

// --- artifact extraction -----------------------------------------------------------

/// Artifacts produced by a call's response.
pub fn produced_artifacts(call: &ParsedExchange<'_>, config: &AnalysisConfig) -> Vec<Artifact> {
    let mut out = Vec::new();
    if let Some(body) = call.response_json.as_deref() {
        walk_json(body, "body", 0, config, &mut out);
    }
    for (name, value) in &call.source.response_headers {
        let lower = name.to_lowercase();
        if lower == "set-cookie" {
            for line in value.lines() {
                if let Some((cookie, v)) = parse_set_cookie(line) {
                    push_str(&mut out, format!("cookie.{cookie}"), v);
                }
            }
        } else if is_auth_like_header(&lower) {
            push_str(&mut out, format!("header.{lower}"), value);
        }
    }
    out
}

/// Artifacts consumed by a call's request. `template` supplies the raw
/// values of wildcarded path segments.
pub fn consumed_artifacts(
    call: &ParsedExchange<'_>,
    template: &RouteTemplate,
    config: &AnalysisConfig,
) -> Vec<Artifact> {
    let mut out = Vec::new();
    for (key, value) in &call.query {
        push_str(&mut out, format!("query.{key}"), value);
    }
    for param in &template.params {
        push_str(&mut out, format!("path.{}", param.name), &param.example);
    }
    if let Some(body) = call.request_json.as_deref() {
        walk_json(body, "body", 0, config, &mut out);
    }
    for (name, value) in &call.source.request_headers {
        let lower = name.to_lowercase();
        if lower != "cookie" && is_auth_like_header(&lower) {
            push_str(&mut out, format!("header.{lower}"), strip_auth_scheme(value));
        }
    }
    let mut cookies: BTreeMap<&str, &str> = call
        .source
        .request_cookies
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if cookies.is_empty() {
        if let Some(raw) = header(&call.source.request_headers, "cookie") {
            cookies.extend(
                raw.split(';')
                    .filter_map(|pair| pair.trim().split_once('='))
                    .map(|(k, v)| (k.trim(), v.trim())),
            );
        }
    }
    for (name, value) in cookies {
        if !name.is_empty() {
            push_str(&mut out, format!("cookie.{name}"), value);
        }
    }
    out
}

fn push_str(out: &mut Vec<Artifact>, name: String, value: &str) {
    out.push(Artifact {
        name,
        value_hash: hash_str(value),
    });
}

fn walk_json(
    value: &Value,
    prefix: &str,
    depth: usize,
    config: &AnalysisConfig,
    out: &mut Vec<Artifact>,
) {
    match value {
        Value::Object(map) => {
            if depth >= config.artifact_max_depth {
                return;
            }
            for (key, child) in map.iter().take(config.artifact_max_keys) {
                walk_json(child, &format!("{prefix}.{key}"), depth + 1, config, out);
            }
        }
        Value::Array(items) => {
            if depth >= config.artifact_max_depth {
                return;
            }
            let name = format!("{prefix}[]");
            for item in items.iter().take(config.artifact_array_sample) {
                walk_json(item, &name, depth + 1, config, out);
            }
        }
        primitive => out.push(Artifact {
            name: prefix.to_string(),
            value_hash: hash_primitive(primitive),
        }),
    }
}

fn parse_set_cookie(line: &str) -> Option<(&str, &str)> {
    let first = line.split(';').next()?;
    let (name, value) = first.trim().split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some((name, value.trim()))
}

// --- per-call indexes ------------------------------------------------------------

/// Lookup tables over one call's artifacts, built once so each pair
/// comparison is a handful of map probes.
#[derive(Debug, Default)]
struct CallIndex {
    /// value hash -> first artifact name carrying it
    by_hash: BTreeMap<String, String>,
    /// leaf field names
    names: BTreeSet<String>,
}

impl CallIndex {
    fn new(artifacts: &[Artifact]) -> Self {
        let mut idx = Self::default();
        for a in artifacts {
            if let Some(h) = &a.value_hash {
                idx.by_hash.entry(h.clone()).or_insert_with(|| a.name.clone());
            }
            let leaf = leaf_name(&a.name);
            if !leaf.is_empty() {
                idx.names.insert(leaf.to_string());
            }
        }
        idx
    }
}

#[derive(Debug, Default)]
struct EdgeAccumulator {
    labels: BTreeSet<String>,
    strong: usize,
    weak: usize,
}

impl EdgeAccumulator {
    fn label(&mut self, label: String, cap: usize) {
        if self.labels.len() < cap || self.labels.contains(&label) {
            self.labels.insert(label);
        }
    }
}

// --- builder -------------------------------------------------------------------

/// Builds a [`DependencyGraph`] over one time-ordered trace.
#[derive(Debug, Clone)]
pub struct GraphBuilder<'c> {
    config: &'c AnalysisConfig,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(config: &'c AnalysisConfig) -> Self {
        Self { config }
    }

    /// `calls`, `templates` and `call_groups` are index-aligned: call `i`
    /// has route template `templates[i]` and belongs to the group keyed
    /// `call_groups[i]`. `calls` must already be in time order.
    pub fn build(
        &self,
        calls: &[ParsedExchange<'_>],
        templates: &[RouteTemplate],
        call_groups: &[String],
        groups: &[EndpointGroup],
    ) -> DependencyGraph {
        let n = calls.len().min(templates.len()).min(call_groups.len());
        let produced: Vec<CallIndex> = calls[..n]
            .iter()
            .map(|c| CallIndex::new(&produced_artifacts(c, self.config)))
            .collect();
        let consumed: Vec<CallIndex> = calls[..n]
            .iter()
            .zip(templates)
            .map(|(c, t)| CallIndex::new(&consumed_artifacts(c, t, self.config)))
            .collect();

        let mut edges: BTreeMap<(String, String), EdgeAccumulator> = BTreeMap::new();
        for a in 0..n {
            for b in (a + 1)..n {
                let (from, to) = (&call_groups[a], &call_groups[b]);
                if from == to {
                    continue;
                }
                self.match_pair(&produced[a], &consumed[b], from, to, &mut edges);
            }
        }

        let mut calls_per_group: HashMap<&str, usize> = HashMap::new();
        for key in &call_groups[..n] {
            *calls_per_group.entry(key.as_str()).or_default() += 1;
        }
        let mut nodes: Vec<GraphNode> = groups
            .iter()
            .map(|g| GraphNode {
                key: g.key.clone(),
                method: g.method.clone(),
                path: g.normalized_path.clone(),
                category: g.category,
                calls: calls_per_group.get(g.key.as_str()).copied().unwrap_or(0),
            })
            .collect();
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        nodes.dedup_by(|a, b| a.key == b.key);

        let mut edges: Vec<DependencyEdge> = edges
            .into_iter()
            .filter_map(|((from, to), acc)| {
                let confidence = edge_confidence(acc.strong, acc.weak);
                (confidence > 0.0).then(|| DependencyEdge {
                    from,
                    to,
                    artifacts: acc.labels.into_iter().collect(),
                    evidence_count: if acc.strong > 0 { acc.strong } else { acc.weak },
                    confidence,
                    has_value_match: acc.strong > 0,
                })
            })
            .collect();
        edges.sort_by(|a, b| {
            a.from
                .cmp(&b.from)
                .then_with(|| a.to.cmp(&b.to))
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });

        tracing::debug!(calls = n, nodes = nodes.len(), edges = edges.len(), "built dependency graph");
        DependencyGraph {
            version: GRAPH_VERSION,
            meta: GraphMeta {
                calls: n,
                edges: edges.len(),
                inferred_by: INFERRED_BY.into(),
            },
            nodes,
            edges,
        }
    }

    fn match_pair(
        &self,
        producer: &CallIndex,
        consumer: &CallIndex,
        from: &str,
        to: &str,
        edges: &mut BTreeMap<(String, String), EdgeAccumulator>,
    ) {
        let strong: Vec<String> = consumer
            .by_hash
            .iter()
            .filter_map(|(hash, consumed_name)| {
                producer
                    .by_hash
                    .get(hash)
                    .map(|produced_name| format!("{produced_name} -> {consumed_name}"))
            })
            .collect();

        let cap = self.config.max_edge_labels;
        if !strong.is_empty() {
            let acc = edges.entry((from.to_string(), to.to_string())).or_default();
            acc.strong += strong.len();
            for label in strong {
                acc.label(label, cap);
            }
            return;
        }

        let weak: Vec<&String> = producer
            .names
            .intersection(&consumer.names)
            .take(self.config.max_weak_matches)
            .collect();
        if weak.is_empty() {
            return;
        }
        let acc = edges.entry((from.to_string(), to.to_string())).or_default();
        acc.weak += weak.len();
        for name in weak {
            acc.label(name.clone(), cap);
        }
    }
}

// --- traversal -------------------------------------------------------------------

impl DependencyGraph {
    /// Every node that must run before `key`, nearest first.
    pub fn upstream(&self, key: &str) -> Vec<&GraphNode> {
        self.bfs(key, Direction::Upstream)
    }

    /// Every node that consumes, directly or transitively, what `key`
    /// produces.
    pub fn downstream(&self, key: &str) -> Vec<&GraphNode> {
        self.bfs(key, Direction::Downstream)
    }

    // Breadth-first, excluding the start node.
    fn bfs(&self, start: &str, direction: Direction) -> Vec<&GraphNode> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut result = Vec::new();

        visited.insert(start);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            for edge in &self.edges {
                let next = match direction {
                    Direction::Upstream if edge.to == current => edge.from.as_str(),
                    Direction::Downstream if edge.from == current => edge.to.as_str(),
                    _ => continue,
                };
                if visited.insert(next) {
                    queue.push_back(next);
                    if let Some(node) = self.node(next) {
                        result.push(node);
                    }
                }
            }
        }
        result
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

// --- tests -------------------------------------------------------------------
