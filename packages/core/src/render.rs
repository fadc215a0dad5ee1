//! Human-readable text rendering of endpoint groups and dependency graphs.
//!
//! The output is stable plain text suitable for terminals or logs. It is not
//! a canonical format; only the JSON output is a contract.

use crate::types::{DependencyGraph, EndpointGroup};

/// Render a single [`EndpointGroup`] as indented plain text.
///
/// ```text
/// [read] GET /users/{userId}/orders  (3 calls)
/// List orders for a user
///
/// Path parameters:
///   userId  integer  e.g. 42
///
/// Query parameters:
///   page  integer  e.g. 2  (required)
///
/// Response: array[20]   status: 200
/// Produces: [].id
/// Consumes: userId
/// Depends on: POST /auth/login
/// ```
pub fn render_group(group: &EndpointGroup) -> String {
    let mut out = String::new();

    let calls = group.example_count;
    out.push_str(&format!(
        "[{}] {}  ({} call{})\n",
        group.category,
        group.key,
        calls,
        if calls == 1 { "" } else { "s" }
    ));
    out.push_str(&group.description);
    out.push('\n');

    if !group.path_params.is_empty() {
        out.push_str("\nPath parameters:\n");
        for p in &group.path_params {
            out.push_str(&format!(
                "  {}  {}  e.g. {}\n",
                p.name,
                p.param_type,
                truncate(&p.example, 40)
            ));
        }
    }

    if !group.query_params.is_empty() {
        out.push_str("\nQuery parameters:\n");
        for q in &group.query_params {
            let required = if q.required { "  (required)" } else { "" };
            out.push_str(&format!(
                "  {}  {}  e.g. {}{}\n",
                q.name,
                q.param_type,
                truncate(&q.example, 40),
                required
            ));
        }
    }

    let mut shape = Vec::new();
    if let Some(schema) = &group.request_body_schema {
        shape.push(format!("Request: {}", schema.type_name()));
    }
    if let Some(summary) = &group.response_summary {
        shape.push(format!("Response: {summary}"));
    }
    if !group.status_codes.is_empty() {
        let codes: Vec<String> = group.status_codes.iter().map(u16::to_string).collect();
        shape.push(format!("status: {}", codes.join(",")));
    }
    if !shape.is_empty() {
        out.push('\n');
        out.push_str(&shape.join("   "));
        out.push('\n');
    }

    for (label, set) in [
        ("Produces", &group.produces),
        ("Consumes", &group.consumes),
        ("Depends on", &group.dependencies),
    ] {
        if !set.is_empty() {
            let items: Vec<&str> = set.iter().map(String::as_str).collect();
            out.push_str(&format!("{label}: {}\n", items.join(", ")));
        }
    }

    out
}

/// Render groups as a summary table, one line per group, in the order given.
///
/// ```text
/// Endpoints  2 groups
/// ───────────────────
///   auth    POST  /auth/login       Authenticate
///   read    GET   /users/{userId}   Get a user by ID  ← 1 dep
/// ```
pub fn render_groups(groups: &[EndpointGroup]) -> String {
    let total = groups.len();
    let header = format!("Endpoints  {} group{}", total, if total == 1 { "" } else { "s" });
    let rule = "─".repeat(header.chars().count());
    let mut out = format!("{header}\n{rule}\n");

    let method_w = groups.iter().map(|g| g.method.len()).max().unwrap_or(0);
    let path_w = groups
        .iter()
        .map(|g| display_path(g).chars().count())
        .max()
        .unwrap_or(0);

    for g in groups {
        let deps = match g.dependencies.len() {
            0 => String::new(),
            1 => "  ← 1 dep".to_string(),
            n => format!("  ← {n} deps"),
        };
        let line = format!(
            "  {:<6}  {:<method_w$}  {:<path_w$}  {}{}",
            g.category.to_string(),
            g.method,
            display_path(g),
            truncate(&g.description, 60),
            deps,
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Render a [`DependencyGraph`] as a node count header followed by edges
/// grouped under their consuming node.
///
/// ```text
/// Dependency graph  2 nodes, 1 edge, 2 calls
/// ──────────────────────────────────────────
///
/// GET /me  (read)
///   ← POST /auth/login  0.73  value match
///       body.accessToken -> header.authorization
/// ```
pub fn render_graph(graph: &DependencyGraph) -> String {
    let nodes = graph.nodes.len();
    let edges = graph.edges.len();
    let header = format!(
        "Dependency graph  {} node{}, {} edge{}, {} call{}",
        nodes,
        plural(nodes),
        edges,
        plural(edges),
        graph.meta.calls,
        plural(graph.meta.calls)
    );
    let rule = "─".repeat(header.chars().count());
    let mut out = format!("{header}\n{rule}\n");

    for node in &graph.nodes {
        let incoming = graph.incoming(&node.key);
        if incoming.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("{}  ({})\n", node.key, node.category));
        for e in incoming {
            let kind = if e.has_value_match {
                "value match"
            } else {
                "name match"
            };
            out.push_str(&format!("  ← {}  {:.2}  {}\n", e.from, e.confidence, kind));
            for label in &e.artifacts {
                out.push_str(&format!("      {label}\n"));
            }
        }
    }

    let isolated: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| graph.incoming(&n.key).is_empty() && graph.outgoing(&n.key).is_empty())
        .map(|n| n.key.as_str())
        .collect();
    if !isolated.is_empty() {
        out.push_str(&format!("\nUnconnected ({})\n", isolated.len()));
        for key in isolated {
            out.push_str(&format!("  {key}\n"));
        }
    }

    out
}

// --- helpers -----------------------------------------------------------------

fn display_path(group: &EndpointGroup) -> String {
    match &group.operation {
        Some(op) => format!("{}#{}", group.normalized_path, op),
        None => group.normalized_path.clone(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// --- tests -------------------------------------------------------------------
