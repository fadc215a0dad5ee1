//! End-to-end scenarios over small, realistic traces.

use apiweave::render::{render_graph, render_groups};
use apiweave::{
    analyze, validate_graph, AnalysisConfig, AnalysisSession, AuthScheme, CapturedExchange,
    Category, DependencyGraph, ParamType,
};
use serde_json::json;

fn login_then_me() -> Vec<CapturedExchange> {
    vec![
        CapturedExchange::new("POST", "https://api.example.com/auth/login")
            .with_request_json(json!({"email": "ann@example.com", "password": "hunter22"}))
            .with_response_json(json!({"accessToken": "abc123def456ghi789"})),
        CapturedExchange::new("GET", "https://api.example.com/me")
            .with_request_header("Authorization", "Bearer abc123def456ghi789")
            .with_response_json(json!({"id": 501, "email": "ann@example.com"})),
    ]
}

#[test]
fn login_token_feeds_later_calls() {
    let analysis = analyze(&login_then_me());

    let auth: Vec<_> = analysis
        .groups
        .iter()
        .filter(|g| g.category == Category::Auth)
        .collect();
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].key, "POST /auth/login");

    let edge = analysis.graph.edge("POST /auth/login", "GET /me").unwrap();
    assert!(edge.has_value_match);
    assert!((edge.confidence - 0.73).abs() < 1e-9);
    assert_eq!(analysis.auth_scheme, AuthScheme::Bearer);
    assert_eq!(analysis.service, "example");
    assert!(validate_graph(&analysis.graph).is_ok());
}

#[test]
fn list_feeds_detail() {
    let trace = vec![
        CapturedExchange::new("GET", "https://api.example.com/items")
            .with_response_json(json!({"items": [{"id": 1}, {"id": 2}]})),
        CapturedExchange::new("GET", "https://api.example.com/items/1")
            .with_response_json(json!({"id": 1, "name": "first"})),
    ];
    let analysis = analyze(&trace);

    let detail = analysis.group("GET /items/{id}").unwrap();
    assert_eq!(detail.path_params[0].param_type, ParamType::Integer);
    assert!(detail.consumes.contains("id"));

    let list = analysis.group("GET /items").unwrap();
    assert!(list.produces.contains("items[].id"));
    assert!(detail.dependencies.contains("GET /items"));

    assert!(!analysis.graph.edges.is_empty());
    assert!(analysis.graph.edge("GET /items", "GET /items/{id}").is_some());
}

#[test]
fn extreme_integer_cursor_links_pages() {
    let trace = vec![
        CapturedExchange::new("GET", "https://api.example.com/balance")
            .with_response_json(json!({"cursor": i64::MIN})),
        CapturedExchange::new("GET", "https://api.example.com/next?cursor=-9223372036854775808"),
    ];
    let analysis = analyze(&trace);
    assert_eq!(analysis.groups.len(), 2);

    let edge = analysis
        .graph
        .edge("GET /balance", "GET /next")
        .expect("cursor edge");
    assert!(edge.has_value_match);
    assert!((edge.confidence - 0.73).abs() < 1e-9);
    assert!(validate_graph(&analysis.graph).is_ok());
}

#[test]
fn empty_trace_is_an_empty_result() {
    let analysis = analyze(&[]);
    assert!(analysis.groups.is_empty());
    assert_eq!(analysis.graph, DependencyGraph::empty());

    let v = serde_json::to_value(&analysis.graph).unwrap();
    assert_eq!(
        v,
        json!({
            "version": 2,
            "nodes": [],
            "edges": [],
            "meta": {"calls": 0, "edges": 0, "inferredBy": "heuristic-v2"}
        })
    );
}

#[test]
fn unrelated_calls_have_no_edges() {
    let trace = vec![
        CapturedExchange::new("GET", "https://api.example.com/weather")
            .with_response_json(json!({"celsius": 21, "summary": "sunny"})),
        CapturedExchange::new("POST", "https://api.example.com/feedback")
            .with_request_json(json!({"comment": "great"})),
    ];
    let analysis = analyze(&trace);
    assert_eq!(analysis.groups.len(), 2);
    assert!(analysis.graph.edges.is_empty());
}

#[test]
fn single_literal_route_is_kept_literal() {
    let analysis = analyze(&[CapturedExchange::new(
        "GET",
        "https://api.example.com/reports/q4-2024",
    )]);
    assert_eq!(analysis.groups[0].normalized_path, "/reports/q4-2024");

    let analysis = analyze(&[
        CapturedExchange::new("GET", "https://api.example.com/reports/q4-2024"),
        CapturedExchange::new("GET", "https://api.example.com/reports/q1-2024"),
    ]);
    assert_eq!(analysis.groups.len(), 1);
    assert_eq!(analysis.groups[0].normalized_path, "/reports/{id}");
    assert_eq!(analysis.groups[0].example_count, 2);
}

#[test]
fn schema_merging_is_order_independent_across_runs() {
    let bodies = [
        json!({"id": 1, "price": 10, "tags": ["a"]}),
        json!({"id": 2, "price": 10.5}),
        json!({"id": 3, "price": 12, "note": null}),
    ];
    let forward: Vec<CapturedExchange> = bodies
        .iter()
        .map(|b| CapturedExchange::new("GET", "/products").with_response_json(b.clone()))
        .collect();
    let mut backward = forward.clone();
    backward.reverse();

    let a = analyze(&forward);
    let b = analyze(&backward);
    let sa = a.groups[0].response_body_schema.as_ref().unwrap();
    let sb = b.groups[0].response_body_schema.as_ref().unwrap();
    assert_eq!(sa, sb);

    let schema = sa.to_json_schema();
    assert_eq!(schema["properties"]["price"]["type"], "number");
    assert_eq!(schema["required"], json!(["id", "price"]));
}

#[test]
fn crud_workflow_orders_producers_first() {
    let trace = vec![
        CapturedExchange::new("POST", "https://api.example.com/auth/login")
            .with_response_json(json!({"token": "tok-0123456789"})),
        CapturedExchange::new("POST", "https://api.example.com/projects")
            .with_request_header("Authorization", "Bearer tok-0123456789")
            .with_request_json(json!({"name": "Apollo"}))
            .with_response_json(json!({"projectId": 7781, "name": "Apollo"}))
            .with_status(201),
        CapturedExchange::new("GET", "https://api.example.com/projects/7781/tasks?status=open")
            .with_request_header("Authorization", "Bearer tok-0123456789")
            .with_response_json(json!([{"taskId": "tsk-1", "title": "Plan"}])),
        CapturedExchange::new("DELETE", "https://api.example.com/projects/7781")
            .with_request_header("Authorization", "Bearer tok-0123456789")
            .with_status(204),
    ];
    let analysis = analyze(&trace);
    let keys: Vec<&str> = analysis.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys[0], "POST /auth/login");

    let create = analysis.group("POST /projects").unwrap();
    assert_eq!(create.category, Category::Write);
    assert_eq!(create.description, "Create a project");
    assert!(create.status_codes.contains(&201));

    let g = &analysis.graph;
    let e = g.edge("POST /projects", "DELETE /projects/{id}").unwrap();
    assert!(e.has_value_match);
    assert!(e
        .artifacts
        .contains(&"body.projectId -> path.id".to_string()));
    assert!(g.upstream("DELETE /projects/{id}").len() >= 2);
    assert!(g
        .edge("POST /projects", "GET /projects/{projectId}/tasks")
        .is_some_and(|e| e.has_value_match));

    let text = render_groups(&analysis.groups);
    assert!(text.starts_with("Endpoints  4 groups"));
    assert!(render_graph(g).contains("POST /projects"));
    assert!(validate_graph(g).is_ok());
}

#[test]
fn noise_filter_can_be_disabled() {
    let trace = vec![
        CapturedExchange::new("GET", "https://app.example.com/assets/logo.png"),
        CapturedExchange::new("GET", "https://app.example.com/api/feed"),
    ];
    assert_eq!(analyze(&trace).groups.len(), 1);

    let keep = AnalysisConfig {
        filter_noise: false,
        ..AnalysisConfig::default()
    };
    assert_eq!(AnalysisSession::new(keep).run(&trace).groups.len(), 2);
}

#[test]
fn analysis_round_trips_through_json() {
    let analysis = analyze(&login_then_me());
    let text = serde_json::to_string(&analysis).unwrap();
    let back: apiweave::Analysis = serde_json::from_str(&text).unwrap();
    assert_eq!(back.groups, analysis.groups);
    assert_eq!(back.graph.nodes, analysis.graph.nodes);
    assert_eq!(back.auth_scheme, analysis.auth_scheme);
    assert!(text.contains("\"normalizedPath\""));
    assert!(text.contains("\"hasValueMatch\":true"));
}
