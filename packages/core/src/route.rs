//! Route normalization: concrete paths to parameterized templates.
//!
//! Paths are bucketed by method, segment count, and first segment. Within a
//! bucket a segment position becomes a `{placeholder}` once two different
//! values have been seen there, or as soon as any value there looks like an
//! identifier (all digits, a UUID, or a hex string of 16+ characters).
//!
//! Generalization is monotonic: the normalizer only ever accumulates
//! observations, so a position that has been wildcarded stays wildcarded for
//! the rest of the run. A position that has only ever held one
//! non-identifier literal stays literal; `/reports/q4-2024` is not
//! generalized until a second report name is observed.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{ParamType, RouteParam, RouteTemplate};

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("invalid uuid regex")
});

static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{16,}$").expect("invalid hex regex"));

/// Infer the type of a single path-segment or query value.
pub fn infer_param_type(value: &str) -> ParamType {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        ParamType::Integer
    } else if UUID_RE.is_match(value) {
        ParamType::Uuid
    } else if HEX_RE.is_match(value) {
        ParamType::Hash
    } else {
        ParamType::String
    }
}

/// Whether a lone segment value should be wildcarded without corroboration.
pub fn is_identifier_segment(value: &str) -> bool {
    infer_param_type(value) != ParamType::String
}

/// Split a path into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    method: String,
    segments: usize,
    root: String,
}

#[derive(Debug, Default)]
struct Bucket {
    /// Distinct literal values seen at each segment index.
    values: Vec<BTreeSet<String>>,
}

impl Bucket {
    fn is_wildcard(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(|seen| {
            seen.len() >= 2 || seen.iter().any(|v| is_identifier_segment(v))
        })
    }
}

/// Session-scoped state for route generalization.
///
/// Create one per analysis run, feed it every path with [`observe`] first,
/// then ask for templates with [`template`].
///
/// [`observe`]: RouteNormalizer::observe
/// [`template`]: RouteNormalizer::template
#[derive(Debug, Default)]
pub struct RouteNormalizer {
    buckets: HashMap<BucketKey, Bucket>,
}

impl RouteNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path and return its template under everything seen so far.
    pub fn observe(&mut self, method: &str, path: &str) -> RouteTemplate {
        let segments = split_segments(path);
        let bucket = self.buckets.entry(bucket_key(method, &segments)).or_default();
        if bucket.values.len() < segments.len() {
            bucket.values.resize_with(segments.len(), BTreeSet::new);
        }
        for (i, seg) in segments.iter().enumerate() {
            bucket.values[i].insert((*seg).to_string());
        }
        self.template(method, path)
    }

    /// Template for `path` under the current observations, without
    /// recording it. Unobserved buckets fall back to identifier detection.
    pub fn template(&self, method: &str, path: &str) -> RouteTemplate {
        let segments = split_segments(path);
        let bucket = self.buckets.get(&bucket_key(method, &segments));
        let wildcard: Vec<bool> = segments
            .iter()
            .enumerate()
            .map(|(i, seg)| match bucket {
                Some(b) => b.is_wildcard(i),
                None => is_identifier_segment(seg),
            })
            .collect();
        build_template(&segments, &wildcard)
    }

    /// Number of distinct buckets observed.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

fn bucket_key(method: &str, segments: &[&str]) -> BucketKey {
    BucketKey {
        method: method.to_uppercase(),
        segments: segments.len(),
        root: segments.first().map(|s| s.to_string()).unwrap_or_default(),
    }
}

// Names: a trailing placeholder that follows a literal is `id`; others that
// follow a literal take its singular form (`userId`); placeholders with no
// literal before them are positional (`param1`).
fn build_template(segments: &[&str], wildcard: &[bool]) -> RouteTemplate {
    let last_named = segments
        .len()
        .checked_sub(1)
        .filter(|&i| wildcard[i] && i > 0 && !wildcard[i - 1]);

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut params = Vec::new();
    let mut parts = Vec::with_capacity(segments.len());

    for (i, seg) in segments.iter().enumerate() {
        if !wildcard[i] {
            parts.push((*seg).to_string());
            continue;
        }
        let position = params.len() + 1;
        let mut name = if Some(i) == last_named {
            "id".to_string()
        } else if i > 0 && !wildcard[i - 1] {
            format!("{}Id", camel(&singularize(segments[i - 1])))
        } else {
            format!("param{position}")
        };
        if !used.insert(name.clone()) {
            name = format!("{name}{position}");
            used.insert(name.clone());
        }
        parts.push(format!("{{{name}}}"));
        params.push(RouteParam {
            name,
            example: (*seg).to_string(),
            param_type: infer_param_type(seg),
        });
    }

    RouteTemplate {
        path: format!("/{}", parts.join("/")),
        params,
    }
}

/// Naive English singular: `categories` -> `category`, `boxes` -> `box`,
/// `users` -> `user`. Words ending in `ss`/`us`, or not in `s` at all, are
/// returned unchanged.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", &word[..stem.len()]);
        }
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && word.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// `order-items` / `order_items` -> `orderItems`.
fn camel(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut upper_next = false;
    for c in word.chars() {
        if c == '-' || c == '_' || c == '.' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// --- tests -------------------------------------------------------------------
