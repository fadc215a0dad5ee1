//! Structural schema inference over JSON bodies.
//!
//! [`infer`] turns one JSON value into a [`SchemaNode`]; [`SchemaNode::merge`]
//! combines two nodes. Merging is commutative and associative, so folding
//! the same samples in any order produces an identical tree. That property
//! is what keeps regenerated output stable when traffic is re-captured in a
//! different order.
//!
//! Merge rules:
//!
//! - same kind: combine, summing sample counts
//! - `Integer` with `Number`: `Number` (one fractional sample is enough)
//! - objects: union of properties (each merged recursively); `required` is
//!   the intersection of both sides' `required`
//! - arrays: merge item schemas
//! - different kinds: a flat `Union` holding at most one variant per kind

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Array elements inferred per array when no limit is given.
pub const DEFAULT_ARRAY_SAMPLE: usize = 20;

/// The structural shape of a JSON value, plus how many samples it has seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaNode {
    #[serde(flatten)]
    pub kind: SchemaKind,
    pub samples: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaKind {
    Null,
    #[serde(rename = "boolean")]
    Bool,
    Integer,
    Number,
    String,
    Array {
        /// `None` until a non-empty array has been seen.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<SchemaNode>>,
    },
    Object {
        properties: BTreeMap<String, SchemaNode>,
        /// Keys present in every merged sample. Always a subset of
        /// `properties`.
        required: BTreeSet<String>,
    },
    Union {
        /// One variant per kind, ordered by kind.
        variants: Vec<SchemaNode>,
    },
}

/// Kinds that merge with each other instead of forming a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Family {
    Null,
    Bool,
    Numeric,
    String,
    Array,
    Object,
}

/// Infer a schema from one JSON value, sampling up to
/// [`DEFAULT_ARRAY_SAMPLE`] elements per array.
pub fn infer(value: &Value) -> SchemaNode {
    infer_with(value, DEFAULT_ARRAY_SAMPLE)
}

/// Infer a schema, sampling at most `array_sample` elements per array.
pub fn infer_with(value: &Value, array_sample: usize) -> SchemaNode {
    let kind = match value {
        Value::Null => SchemaKind::Null,
        Value::Bool(_) => SchemaKind::Bool,
        Value::Number(n) => {
            let integral = n.is_i64()
                || n.is_u64()
                || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0);
            if integral {
                SchemaKind::Integer
            } else {
                SchemaKind::Number
            }
        }
        Value::String(_) => SchemaKind::String,
        Value::Array(items) => SchemaKind::Array {
            items: merge_all(items.iter().take(array_sample.max(1)).map(|v| infer_with(v, array_sample)))
                .map(Box::new),
        },
        Value::Object(map) => SchemaKind::Object {
            properties: map
                .iter()
                .map(|(k, v)| (k.clone(), infer_with(v, array_sample)))
                .collect(),
            required: map.keys().cloned().collect(),
        },
    };
    SchemaNode { kind, samples: 1 }
}

/// Fold any number of nodes into one. `None` for an empty input.
pub fn merge_all(nodes: impl IntoIterator<Item = SchemaNode>) -> Option<SchemaNode> {
    nodes.into_iter().reduce(|acc, n| acc.merge(&n))
}

impl SchemaNode {
    /// Merge two schemas into one that describes samples of either.
    pub fn merge(&self, other: &SchemaNode) -> SchemaNode {
        let mut by_family: BTreeMap<Family, SchemaNode> = BTreeMap::new();
        for variant in self.variants().into_iter().chain(other.variants()) {
            let family = variant.family();
            let merged = match by_family.remove(&family) {
                Some(existing) => merge_same_family(&existing, variant),
                None => variant.clone(),
            };
            by_family.insert(family, merged);
        }

        let samples = self.samples + other.samples;
        let mut variants: Vec<SchemaNode> = by_family.into_values().collect();
        if variants.len() == 1 {
            if let Some(only) = variants.pop() {
                return only;
            }
        }
        SchemaNode {
            kind: SchemaKind::Union { variants },
            samples,
        }
    }

    /// Short type name: `object`, `array<string>`, `integer|null`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            SchemaKind::Null => "null".into(),
            SchemaKind::Bool => "boolean".into(),
            SchemaKind::Integer => "integer".into(),
            SchemaKind::Number => "number".into(),
            SchemaKind::String => "string".into(),
            SchemaKind::Array { items: None } => "array".into(),
            SchemaKind::Array { items: Some(items) } => format!("array<{}>", items.type_name()),
            SchemaKind::Object { .. } => "object".into(),
            SchemaKind::Union { variants } => variants
                .iter()
                .map(SchemaNode::type_name)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }

    /// Dotted paths of every object field reachable through objects and
    /// arrays. Array traversal appends `[]`: `{"items":[{"id":1}]}` yields
    /// `items`, `items[].id`.
    pub fn field_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(self, "", &mut out);
        out
    }

    /// Render as a JSON Schema fragment.
    pub fn to_json_schema(&self) -> Value {
        match &self.kind {
            SchemaKind::Null => json!({"type": "null"}),
            SchemaKind::Bool => json!({"type": "boolean"}),
            SchemaKind::Integer => json!({"type": "integer"}),
            SchemaKind::Number => json!({"type": "number"}),
            SchemaKind::String => json!({"type": "string"}),
            SchemaKind::Array { items } => match items {
                Some(items) => json!({"type": "array", "items": items.to_json_schema()}),
                None => json!({"type": "array"}),
            },
            SchemaKind::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_schema()))
                    .collect();
                json!({
                    "type": "object",
                    "properties": props,
                    "required": required.iter().collect::<Vec<_>>(),
                })
            }
            SchemaKind::Union { variants } => json!({
                "anyOf": variants.iter().map(SchemaNode::to_json_schema).collect::<Vec<_>>(),
            }),
        }
    }

    fn variants(&self) -> Vec<&SchemaNode> {
        match &self.kind {
            SchemaKind::Union { variants } => variants.iter().collect(),
            _ => vec![self],
        }
    }

    fn family(&self) -> Family {
        match &self.kind {
            SchemaKind::Null => Family::Null,
            SchemaKind::Bool => Family::Bool,
            SchemaKind::Integer | SchemaKind::Number => Family::Numeric,
            SchemaKind::String => Family::String,
            SchemaKind::Array { .. } => Family::Array,
            SchemaKind::Object { .. } => Family::Object,
            // Unions are flattened before families are compared.
            SchemaKind::Union { .. } => Family::Object,
        }
    }
}

fn merge_same_family(a: &SchemaNode, b: &SchemaNode) -> SchemaNode {
    let samples = a.samples + b.samples;
    let kind = match (&a.kind, &b.kind) {
        (SchemaKind::Integer, SchemaKind::Integer) => SchemaKind::Integer,
        (SchemaKind::Integer | SchemaKind::Number, SchemaKind::Integer | SchemaKind::Number) => {
            SchemaKind::Number
        }
        (SchemaKind::Array { items: x }, SchemaKind::Array { items: y }) => SchemaKind::Array {
            items: match (x, y) {
                (Some(x), Some(y)) => Some(Box::new(x.merge(y))),
                (Some(only), None) | (None, Some(only)) => Some(only.clone()),
                (None, None) => None,
            },
        },
        (
            SchemaKind::Object {
                properties: pa,
                required: ra,
            },
            SchemaKind::Object {
                properties: pb,
                required: rb,
            },
        ) => {
            let mut properties = pa.clone();
            for (key, node) in pb {
                let merged = match properties.get(key) {
                    Some(existing) => existing.merge(node),
                    None => node.clone(),
                };
                properties.insert(key.clone(), merged);
            }
            SchemaKind::Object {
                properties,
                required: ra.intersection(rb).cloned().collect(),
            }
        }
        (same, _) => same.clone(),
    };
    SchemaNode { kind, samples }
}

fn collect_paths(node: &SchemaNode, prefix: &str, out: &mut Vec<String>) {
    match &node.kind {
        SchemaKind::Object { properties, .. } => {
            for (key, child) in properties {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                out.push(path.clone());
                collect_paths(child, &path, out);
            }
        }
        SchemaKind::Array { items: Some(items) } => {
            collect_paths(items, &format!("{prefix}[]"), out);
        }
        SchemaKind::Union { variants } => {
            for v in variants {
                collect_paths(v, prefix, out);
            }
        }
        _ => {}
    }
}

// --- tests -------------------------------------------------------------------
