//! Traffic analysis for undocumented HTTP APIs.
//!
//! Feed this crate a trace of captured request/response exchanges and it
//! returns what a client generator needs: generalised route templates,
//! merged body schemas, endpoint groups with a category and description,
//! and a graph of which calls feed values into which later calls.
//!
//! The pipeline is pure and synchronous. It performs no I/O, never fails on
//! malformed input (bad URLs and bodies degrade to "absent"), and keeps no
//! state between runs.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Input and output types: [`CapturedExchange`], [`EndpointGroup`], [`DependencyGraph`] |
//! | [`config`] | [`AnalysisConfig`] thresholds |
//! | [`filters`] | Heuristic pattern tables: identifier fields, auth routes, auth headers, noise |
//! | [`auth`] | Auth scheme detection and service naming |
//! | [`exchange`] | Best-effort decoding of one exchange |
//! | [`route`] | Route normalization into `{param}` templates |
//! | [`fingerprint`] | Stable variant identities |
//! | [`schema`] | Structural JSON schema inference and merging |
//! | [`analyzer`] | Endpoint grouping, classification, producers and consumers |
//! | [`graph`] | Cross-call dependency inference |
//! | [`order`] | Execution-order heuristic |
//! | [`session`] | One analysis run, end to end |
//! | [`validation`] | Lints for exchanges and graph documents |
//! | [`render`] | Plain-text views |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use apiweave::{analyze, CapturedExchange};
//! use serde_json::json;
//!
//! let trace = vec![
//!     CapturedExchange::new("POST", "https://api.example.com/auth/login")
//!         .with_response_json(json!({"accessToken": "abc123def456"})),
//!     CapturedExchange::new("GET", "https://api.example.com/me")
//!         .with_request_header("Authorization", "Bearer abc123def456"),
//! ];
//!
//! let analysis = analyze(&trace);
//! let edge = analysis.graph.edge("POST /auth/login", "GET /me").unwrap();
//! assert!(edge.has_value_match);
//! ```

pub mod analyzer;
pub mod auth;
pub mod config;
pub mod exchange;
pub mod filters;
pub mod fingerprint;
pub mod graph;
pub mod order;
pub mod render;
pub mod route;
pub mod schema;
pub mod session;
pub mod types;
pub mod validation;

pub use auth::AuthScheme;
pub use config::AnalysisConfig;
pub use schema::{SchemaKind, SchemaNode};
pub use session::{Analysis, AnalysisSession};
pub use types::{
    Artifact, CapturedExchange, Category, DependencyEdge, DependencyGraph, EndpointGroup,
    EndpointVariant, GraphMeta, GraphNode, ParamType, QueryParam, RouteParam, RouteTemplate,
    GRAPH_VERSION, INFERRED_BY,
};
pub use validation::{
    parse_trace, validate_exchange, validate_graph, GraphValidationError, TraceError,
    ValidationError,
};

/// Analyse a trace with the default configuration.
pub fn analyze(trace: &[CapturedExchange]) -> Analysis {
    AnalysisSession::default().run(trace)
}
