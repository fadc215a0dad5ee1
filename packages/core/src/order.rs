//! Execution-order heuristic for endpoint groups.
//!
//! Auth groups first, then fewest dependencies first, then category order,
//! then path. This approximates "producers before consumers" well enough
//! for code generators. It is not a topological sort and makes no promise
//! about cycles.

use std::cmp::Ordering;

use crate::types::{Category, EndpointGroup};

/// Stable sort of `groups` into execution order.
pub fn order_groups(groups: &mut [EndpointGroup]) {
    groups.sort_by(compare);
}

/// The ordering [`order_groups`] applies.
pub fn compare(a: &EndpointGroup, b: &EndpointGroup) -> Ordering {
    let auth = |g: &EndpointGroup| g.category != Category::Auth;
    auth(a)
        .cmp(&auth(b))
        .then_with(|| a.dependencies.len().cmp(&b.dependencies.len()))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.normalized_path.cmp(&b.normalized_path))
        .then_with(|| a.key.cmp(&b.key))
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn group(method: &str, path: &str, category: Category, deps: &[&str]) -> EndpointGroup {
        EndpointGroup {
            key: format!("{method} {path}"),
            method: method.into(),
            normalized_path: path.into(),
            operation: None,
            category,
            description: String::new(),
            fingerprint: String::new(),
            path_params: vec![],
            query_params: vec![],
            request_body_schema: None,
            response_body_schema: None,
            response_summary: None,
            status_codes: BTreeSet::new(),
            produces: BTreeSet::new(),
            consumes: BTreeSet::new(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            variants: vec![],
            example_count: 1,
        }
    }

    fn keys(groups: &[EndpointGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    #[test]
    fn auth_first_then_fewest_dependencies() {
        let mut groups = vec![
            group("GET", "/tasks", Category::Read, &["a", "b"]),
            group("GET", "/projects", Category::Read, &["a"]),
            group("POST", "/auth/refresh", Category::Auth, &["x", "y", "z"]),
            group("POST", "/auth/login", Category::Auth, &[]),
        ];
        order_groups(&mut groups);
        assert_eq!(
            keys(&groups),
            vec!["POST /auth/login", "POST /auth/refresh", "GET /projects", "GET /tasks"]
        );
    }

    #[test]
    fn ties_break_on_category_then_path() {
        let mut groups = vec![
            group("DELETE", "/a", Category::Delete, &[]),
            group("POST", "/b", Category::Write, &[]),
            group("GET", "/z", Category::Read, &[]),
            group("GET", "/c", Category::Read, &[]),
            group("TRACE", "/a", Category::Other, &[]),
        ];
        order_groups(&mut groups);
        assert_eq!(
            keys(&groups),
            vec!["GET /c", "GET /z", "POST /b", "DELETE /a", "TRACE /a"]
        );
    }

    #[test]
    fn empty_is_fine() {
        let mut groups: Vec<EndpointGroup> = vec![];
        order_groups(&mut groups);
        assert!(groups.is_empty());
    }
}
