//! Endpoint grouping, classification, and producer/consumer detection.
//!
//! Exchanges are folded into [`EndpointGroup`]s keyed by method and route
//! template. GraphQL traffic is keyed by path and operation name instead,
//! since persisted-query clients send the same operation over several
//! methods. Dependencies between groups need the complete group set, so
//! they are computed in a second pass once every group exists.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::exchange::ParsedExchange;
use crate::filters::{auth_route, is_identifier_field, leaf_name, AuthRoute};
use crate::fingerprint::{basic_fingerprint, body_schema_signature, fingerprint};
use crate::route::{infer_param_type, singularize, split_segments};
use crate::schema::{infer_with, SchemaNode};
use crate::types::{Category, EndpointGroup, EndpointVariant, QueryParam, RouteParam, RouteTemplate};

/// Groups plus, for every input call, the key of the group it landed in.
#[derive(Debug, Clone)]
pub struct GroupedTrace {
    pub groups: Vec<EndpointGroup>,
    /// Parallel to the calls passed to [`EndpointAnalyzer::analyze`].
    pub call_groups: Vec<String>,
}

impl GroupedTrace {
    pub fn group(&self, key: &str) -> Option<&EndpointGroup> {
        self.groups.iter().find(|g| g.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupingKey {
    Rest { method: String, path: String },
    Graphql { path: String, operation: Option<String> },
}

#[derive(Debug, Default)]
struct Accumulator {
    path: String,
    operation: Option<String>,
    graphql: bool,
    mutation: bool,
    refresh_grant: bool,
    methods: BTreeMap<String, usize>,
    path_params: Vec<RouteParam>,
    query: BTreeMap<String, (String, usize)>,
    request_schema: Option<SchemaNode>,
    response_schema: Option<SchemaNode>,
    response_summary: Option<String>,
    status_codes: BTreeSet<u16>,
    variants: Vec<EndpointVariant>,
    count: usize,
}

impl Accumulator {
    fn fold(&mut self, call: &ParsedExchange<'_>, template: &RouteTemplate, config: &AnalysisConfig) {
        self.count += 1;
        *self.methods.entry(call.method.clone()).or_default() += 1;

        for param in &template.params {
            if !self.path_params.iter().any(|p| p.name == param.name) {
                self.path_params.push(param.clone());
            }
        }

        let mut seen_here = BTreeSet::new();
        for (key, value) in &call.query {
            if seen_here.insert(key.as_str()) {
                self.query
                    .entry(key.clone())
                    .or_insert_with(|| (value.clone(), 0))
                    .1 += 1;
            }
        }

        if let Some(body) = call.request_json.as_deref() {
            let inferred = infer_with(body, config.schema_array_sample);
            self.request_schema = Some(merge_into(self.request_schema.take(), inferred));
            self.refresh_grant |= is_refresh_grant(body);
            if self.graphql {
                self.mutation |= body
                    .get("query")
                    .and_then(Value::as_str)
                    .is_some_and(|q| q.trim_start().starts_with("mutation"));
            }
        }
        if let Some(body) = call.response_json.as_deref() {
            let inferred = infer_with(body, config.schema_array_sample);
            self.response_schema = Some(merge_into(self.response_schema.take(), inferred));
        }
        if call.is_success() || self.response_summary.is_none() {
            if let Some(summary) = summarize_response(call) {
                self.response_summary = Some(summary);
            }
        }
        if call.source.status != 0 {
            self.status_codes.insert(call.source.status);
        }

        let query_keys = call.query_keys();
        let body_signature = body_schema_signature(call.request_json.as_deref());
        let fp = fingerprint(&call.method, &template.path, &query_keys, &body_signature);
        match self.variants.iter_mut().find(|v| v.fingerprint == fp) {
            Some(v) => v.count += 1,
            None => self.variants.push(EndpointVariant {
                fingerprint: fp,
                query_keys,
                body_signature,
                count: 1,
            }),
        }
    }

    /// Most frequent method; ties go to the alphabetically first.
    fn representative_method(&self) -> String {
        let mut best: Option<(&String, usize)> = None;
        for (method, &count) in &self.methods {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((method, count));
            }
        }
        best.map(|(m, _)| m.clone()).unwrap_or_else(|| "GET".into())
    }

    fn finish(self, config: &AnalysisConfig) -> EndpointGroup {
        let method = self.representative_method();
        let key = match &self.operation {
            Some(op) => format!("{method} {}#{op}", self.path),
            None => format!("{method} {}", self.path),
        };

        let category = if self.graphql {
            graphql_category(self.operation.as_deref(), self.mutation)
        } else if self.refresh_grant {
            Category::Auth
        } else {
            categorize(&method, &self.path)
        };
        let description = if self.graphql {
            describe_graphql(self.operation.as_deref(), category)
        } else if self.refresh_grant {
            auth_description(Some(AuthRoute::Refresh))
        } else {
            describe(&method, &self.path, category)
        };

        let count = self.count.max(1);
        let query_params: Vec<QueryParam> = self
            .query
            .into_iter()
            .map(|(name, (example, occurrences))| QueryParam {
                param_type: infer_param_type(&example),
                required: occurrences as f64 / count as f64 >= config.required_query_ratio,
                name,
                example,
                occurrences,
            })
            .collect();

        let produces = self
            .response_schema
            .as_ref()
            .map(producer_fields)
            .unwrap_or_default();
        let consumes = consumer_fields(
            &self.path_params,
            &query_params,
            self.request_schema.as_ref(),
        );

        EndpointGroup {
            fingerprint: basic_fingerprint(&method, &self.path),
            key,
            method,
            normalized_path: self.path,
            operation: self.operation,
            category,
            description,
            path_params: self.path_params,
            query_params,
            request_body_schema: self.request_schema,
            response_body_schema: self.response_schema,
            response_summary: self.response_summary,
            status_codes: self.status_codes,
            produces,
            consumes,
            dependencies: BTreeSet::new(),
            variants: self.variants,
            example_count: self.count,
        }
    }
}

fn merge_into(existing: Option<SchemaNode>, inferred: SchemaNode) -> SchemaNode {
    match existing {
        Some(prev) => prev.merge(&inferred),
        None => inferred,
    }
}

/// Folds parsed exchanges into endpoint groups.
#[derive(Debug, Clone)]
pub struct EndpointAnalyzer<'c> {
    config: &'c AnalysisConfig,
}

impl<'c> EndpointAnalyzer<'c> {
    pub fn new(config: &'c AnalysisConfig) -> Self {
        Self { config }
    }

    /// Group `calls` (with their route templates, index-aligned) and compute
    /// each group's dependencies.
    pub fn analyze(&self, calls: &[ParsedExchange<'_>], templates: &[RouteTemplate]) -> GroupedTrace {
        let mut order: Vec<GroupingKey> = Vec::new();
        let mut accumulators: HashMap<GroupingKey, Accumulator> = HashMap::new();
        let mut call_keys: Vec<GroupingKey> = Vec::with_capacity(calls.len());

        for (call, template) in calls.iter().zip(templates) {
            let grouping = match &call.graphql {
                Some(operation) => GroupingKey::Graphql {
                    path: template.path.clone(),
                    operation: operation.clone(),
                },
                None => GroupingKey::Rest {
                    method: call.method.clone(),
                    path: template.path.clone(),
                },
            };
            let acc = accumulators.entry(grouping.clone()).or_insert_with(|| {
                order.push(grouping.clone());
                Accumulator {
                    path: template.path.clone(),
                    operation: call.graphql.clone().flatten(),
                    graphql: call.graphql.is_some(),
                    ..Accumulator::default()
                }
            });
            acc.fold(call, template, self.config);
            call_keys.push(grouping);
        }

        let mut keys_by_grouping: HashMap<GroupingKey, String> = HashMap::new();
        let mut groups = Vec::with_capacity(order.len());
        for grouping in order {
            if let Some(acc) = accumulators.remove(&grouping) {
                let group = acc.finish(self.config);
                keys_by_grouping.insert(grouping, group.key.clone());
                groups.push(group);
            }
        }
        compute_dependencies(&mut groups);

        let call_groups = call_keys
            .iter()
            .map(|k| keys_by_grouping.get(k).cloned().unwrap_or_default())
            .collect();

        tracing::debug!(groups = groups.len(), calls = calls.len(), "grouped endpoints");
        GroupedTrace {
            groups,
            call_groups,
        }
    }
}

// --- classification ------------------------------------------------------------

/// Auth paths first, then by method.
pub fn categorize(method: &str, path: &str) -> Category {
    if auth_route(path).is_some() {
        return Category::Auth;
    }
    match method.to_uppercase().as_str() {
        "GET" | "HEAD" | "OPTIONS" => Category::Read,
        "DELETE" => Category::Delete,
        "POST" | "PUT" | "PATCH" => Category::Write,
        _ => Category::Other,
    }
}

fn graphql_category(operation: Option<&str>, mutation: bool) -> Category {
    if operation.and_then(|op| auth_route(&camel_to_kebab(op))).is_some() {
        Category::Auth
    } else if mutation {
        Category::Write
    } else {
        Category::Read
    }
}

/// Segments that never name a resource.
fn is_version_segment(seg: &str) -> bool {
    let lower = seg.to_lowercase();
    lower == "api"
        || lower == "rest"
        || (lower.len() > 1
            && lower.starts_with('v')
            && lower[1..].bytes().all(|b| b.is_ascii_digit()))
}

fn is_placeholder(seg: &str) -> bool {
    seg.starts_with('{') && seg.ends_with('}')
}

/// Deterministic one-line description of a REST endpoint.
///
/// `GET /users/{userId}/orders` -> "List orders for a user";
/// `GET /orders/{id}` -> "Get an order by ID"; auth routes get fixed
/// phrases.
pub fn describe(method: &str, path: &str, category: Category) -> String {
    if category == Category::Auth {
        return auth_description(auth_route(path));
    }

    let segments = split_segments(path);
    let resource_at = segments
        .iter()
        .rposition(|s| !is_placeholder(s) && !is_version_segment(s));
    let Some(resource_at) = resource_at else {
        return format!("{} {}", method.to_uppercase(), path);
    };
    let resource = humanize(segments[resource_at]);
    let singular = singular_phrase(&resource);
    let ends_in_param = segments.last().is_some_and(|s| is_placeholder(s));

    let base = match method.to_uppercase().as_str() {
        "GET" | "HEAD" | "OPTIONS" if ends_in_param => {
            format!("Get {} by ID", with_article(&singular))
        }
        "GET" | "HEAD" | "OPTIONS" if singular != resource => format!("List {resource}"),
        "GET" | "HEAD" | "OPTIONS" => format!("Get {resource}"),
        "POST" => format!("Create {}", with_article(&singular)),
        "PUT" | "PATCH" => format!("Update {}", with_article(&singular)),
        "DELETE" => format!("Delete {}", with_article(&singular)),
        other => return format!("{other} {path}"),
    };

    let parent = (0..resource_at.saturating_sub(1))
        .rev()
        .find(|&j| !is_placeholder(segments[j]) && is_placeholder(segments[j + 1]));
    match parent {
        Some(j) => format!(
            "{base} for {}",
            with_article(&singular_phrase(&humanize(segments[j])))
        ),
        None => base,
    }
}

fn auth_description(route: Option<AuthRoute>) -> String {
    match route {
        Some(AuthRoute::Refresh) => "Refresh the access token".into(),
        Some(AuthRoute::Register) => "Register a new account".into(),
        Some(AuthRoute::Logout) => "Log out of the current session".into(),
        Some(AuthRoute::Login) | None => "Authenticate".into(),
    }
}

/// A token request that trades a refresh token, in JSON or form encoding.
fn is_refresh_grant(body: &Value) -> bool {
    let grant = body
        .get("grant_type")
        .or_else(|| body.get("grantType"))
        .and_then(Value::as_str);
    grant.is_some_and(|g| g.eq_ignore_ascii_case("refresh_token"))
}

fn describe_graphql(operation: Option<&str>, category: Category) -> String {
    match (operation, category) {
        (Some(op), Category::Auth) => {
            format!("{} ({op})", auth_description(auth_route(&camel_to_kebab(op))))
        }
        (Some(op), Category::Write) => format!("Run the {op} GraphQL mutation"),
        (Some(op), _) => format!("Run the {op} GraphQL query"),
        (None, _) => "Run a GraphQL request".into(),
    }
}

fn humanize(seg: &str) -> String {
    seg.replace(['-', '_'], " ")
}

fn singular_phrase(phrase: &str) -> String {
    match phrase.rsplit_once(' ') {
        Some((head, last)) => format!("{head} {}", singularize(last)),
        None => singularize(phrase),
    }
}

/// Vowel-initial words read with a leading consonant sound.
static CONSONANT_SOUND_PREFIXES: &[&str] = &[
    "uni", "use", "usa", "usu", "uti", "uri", "ure", "uu", "eu", "ewe", "one", "once",
];

/// Consonant-initial words read with a leading vowel sound.
static VOWEL_SOUND_PREFIXES: &[&str] = &["hour", "honest", "honor", "heir"];

fn with_article(noun: &str) -> String {
    let lower = noun.to_lowercase();
    let vowel = if CONSONANT_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        false
    } else if VOWEL_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        true
    } else {
        lower
            .chars()
            .next()
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
    };
    if vowel {
        format!("an {noun}")
    } else {
        format!("a {noun}")
    }
}

/// `RefreshSession` -> `refresh-session`, so operation names can be run
/// through the auth-route table.
fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

// --- producers and consumers ---------------------------------------------------------

/// Identifier-like response fields, as dotted paths.
pub fn producer_fields(response: &SchemaNode) -> BTreeSet<String> {
    response
        .field_paths()
        .into_iter()
        .filter(|p| is_identifier_field(p))
        .collect()
}

/// Every path parameter, plus identifier-like query keys and request-body
/// fields.
pub fn consumer_fields(
    path_params: &[RouteParam],
    query_params: &[QueryParam],
    request: Option<&SchemaNode>,
) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = path_params.iter().map(|p| p.name.clone()).collect();
    out.extend(
        query_params
            .iter()
            .filter(|q| is_identifier_field(&q.name))
            .map(|q| q.name.clone()),
    );
    if let Some(schema) = request {
        out.extend(schema.field_paths().into_iter().filter(|p| is_identifier_field(p)));
    }
    out
}

/// Second pass over the complete group set.
///
/// Every non-auth group depends on every auth group. Beyond that, B
/// depends on A (A != B) when a consumed field of B equals or contains,
/// case-insensitively, a produced field of A. Fields are compared by their
/// leaf name, so `items[].id` produced by a list call matches an `id` path
/// parameter.
pub fn compute_dependencies(groups: &mut [EndpointGroup]) {
    let auth_keys: Vec<String> = groups
        .iter()
        .filter(|g| g.category == Category::Auth)
        .map(|g| g.key.clone())
        .collect();
    let produced: Vec<(String, BTreeSet<String>)> = groups
        .iter()
        .map(|g| (g.key.clone(), lowercase_leaves(&g.produces)))
        .collect();

    for group in groups.iter_mut() {
        let consumed = lowercase_leaves(&group.consumes);
        let mut deps = BTreeSet::new();
        if group.category != Category::Auth {
            deps.extend(auth_keys.iter().filter(|k| **k != group.key).cloned());
        }
        for (key, fields) in &produced {
            if *key == group.key {
                continue;
            }
            let linked = consumed
                .iter()
                .any(|c| fields.iter().any(|p| c == p || c.contains(p.as_str())));
            if linked {
                deps.insert(key.clone());
            }
        }
        group.dependencies = deps;
    }
}

fn lowercase_leaves(fields: &BTreeSet<String>) -> BTreeSet<String> {
    fields
        .iter()
        .map(|f| leaf_name(f).to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

// --- response summary ------------------------------------------------------------

/// Compact shape of a response: `array[3]`, `object{id,name}`, `string`,
/// or `non-json` for a body that did not parse.
fn summarize_response(call: &ParsedExchange<'_>) -> Option<String> {
    match call.response_json.as_deref() {
        Some(value) => Some(summarize_value(value)),
        None => call
            .source
            .response_body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .map(|_| "non-json".to_string()),
    }
}

pub fn summarize_value(value: &Value) -> String {
    const MAX_KEYS: usize = 6;
    match value {
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            let more = keys.len() > MAX_KEYS;
            keys.truncate(MAX_KEYS);
            format!("object{{{}{}}}", keys.join(","), if more { ",…" } else { "" })
        }
        other => crate::fingerprint::type_tag(other).to_string(),
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteNormalizer;
    use crate::types::CapturedExchange;
    use serde_json::json;

    fn run(trace: &[CapturedExchange]) -> GroupedTrace {
        let config = AnalysisConfig::default();
        let calls: Vec<ParsedExchange<'_>> = trace
            .iter()
            .enumerate()
            .filter_map(|(i, ex)| ParsedExchange::parse(i, ex))
            .collect();
        let mut normalizer = RouteNormalizer::new();
        for c in &calls {
            normalizer.observe(&c.method, &c.path);
        }
        let templates: Vec<RouteTemplate> = calls
            .iter()
            .map(|c| normalizer.template(&c.method, &c.path))
            .collect();
        EndpointAnalyzer::new(&config).analyze(&calls, &templates)
    }

    #[test]
    fn categories() {
        assert_eq!(categorize("POST", "/auth/login"), Category::Auth);
        assert_eq!(categorize("GET", "/oauth/authorize"), Category::Auth);
        assert_eq!(categorize("GET", "/users"), Category::Read);
        assert_eq!(categorize("head", "/users"), Category::Read);
        assert_eq!(categorize("DELETE", "/users/{id}"), Category::Delete);
        assert_eq!(categorize("PATCH", "/users/{id}"), Category::Write);
        assert_eq!(categorize("TRACE", "/users"), Category::Other);
    }

    #[test]
    fn descriptions() {
        assert_eq!(describe("GET", "/api/v2/users", Category::Read), "List users");
        assert_eq!(describe("GET", "/orders/{id}", Category::Read), "Get an order by ID");
        assert_eq!(
            describe("GET", "/users/{userId}/orders", Category::Read),
            "List orders for a user"
        );
        assert_eq!(
            describe("POST", "/users/{userId}/order-items", Category::Write),
            "Create an order item for a user"
        );
        assert_eq!(describe("PUT", "/items/{id}", Category::Write), "Update an item");
        assert_eq!(describe("DELETE", "/items/{id}", Category::Delete), "Delete an item");
        assert_eq!(describe("GET", "/me", Category::Read), "Get me");
        assert_eq!(describe("GET", "/{param1}", Category::Read), "GET /{param1}");
        assert_eq!(describe("POST", "/auth/refresh", Category::Auth), "Refresh the access token");
        assert_eq!(describe("POST", "/auth/login", Category::Auth), "Authenticate");
        assert_eq!(describe("POST", "/logout", Category::Auth), "Log out of the current session");
        assert_eq!(describe("POST", "/signup", Category::Auth), "Register a new account");
    }

    #[test]
    fn articles_follow_sound() {
        assert_eq!(with_article("user"), "a user");
        assert_eq!(with_article("uuid"), "a uuid");
        assert_eq!(with_article("unit"), "a unit");
        assert_eq!(with_article("umbrella"), "an umbrella");
        assert_eq!(with_article("hour slot"), "an hour slot");
        assert_eq!(with_article("order"), "an order");
        assert_eq!(with_article("item"), "an item");
        assert_eq!(with_article("project"), "a project");
        assert_eq!(
            describe("GET", "/units/{unitId}/users/{id}", Category::Read),
            "Get a user by ID for a unit"
        );
    }

    #[test]
    fn refresh_grant_in_body_marks_a_refresh_call() {
        let mut form = CapturedExchange::new("POST", "/oauth/token")
            .with_request_header("Content-Type", "application/x-www-form-urlencoded");
        form.request_body = Some("grant_type=refresh_token&refresh_token=rt-abc123".into());
        let trace = vec![
            form,
            CapturedExchange::new("POST", "/v1/credentials")
                .with_request_json(json!({"grantType": "REFRESH_TOKEN", "refreshToken": "rt-9"})),
            CapturedExchange::new("POST", "/auth/login")
                .with_request_json(json!({"grant_type": "password", "username": "ana"})),
        ];
        let grouped = run(&trace);
        for key in ["POST /oauth/token", "POST /v1/credentials"] {
            let g = grouped.group(key).unwrap();
            assert_eq!(g.category, Category::Auth, "{key}");
            assert_eq!(g.description, "Refresh the access token", "{key}");
        }
        assert_eq!(grouped.group("POST /auth/login").unwrap().description, "Authenticate");
    }

    #[test]
    fn groups_by_method_and_template() {
        let trace = vec![
            CapturedExchange::new("GET", "https://api.x.com/items/1?expand=owner"),
            CapturedExchange::new("GET", "https://api.x.com/items/2"),
            CapturedExchange::new("DELETE", "https://api.x.com/items/2"),
        ];
        let grouped = run(&trace);
        assert_eq!(grouped.groups.len(), 2);
        assert_eq!(grouped.call_groups, vec!["GET /items/{id}", "GET /items/{id}", "DELETE /items/{id}"]);

        let get = grouped.group("GET /items/{id}").unwrap();
        assert_eq!(get.example_count, 2);
        assert_eq!(get.path_params[0].example, "1");
        assert_eq!(get.query_params.len(), 1);
        assert!(!get.query_params[0].required);
        assert_eq!(get.variants.len(), 2);
        assert_eq!(get.description, "Get an item by ID");
        assert!(get.consumes.contains("id"));
    }

    #[test]
    fn query_required_threshold() {
        let mut trace: Vec<CapturedExchange> = (0..4)
            .map(|i| CapturedExchange::new("GET", format!("/search?q=term{i}&page=2")))
            .collect();
        trace.push(CapturedExchange::new("GET", "/search?q=last"));
        let grouped = run(&trace);
        let g = &grouped.groups[0];
        let q = g.query_params.iter().find(|p| p.name == "q").unwrap();
        let page = g.query_params.iter().find(|p| p.name == "page").unwrap();
        assert!(q.required);
        assert_eq!(page.occurrences, 4);
        assert!(page.required);
        assert_eq!(q.example, "term0");
    }

    #[test]
    fn produces_consumes_and_dependencies() {
        let trace = vec![
            CapturedExchange::new("POST", "/auth/login")
                .with_request_json(json!({"username": "ann", "password": "pw"}))
                .with_response_json(json!({"accessToken": "tok-123456", "user": {"id": 9}})),
            CapturedExchange::new("GET", "/projects")
                .with_response_json(json!({"items": [{"projectId": "p-1", "name": "a"}]})),
            CapturedExchange::new("GET", "/tasks?projectId=p-1")
                .with_response_json(json!([{"id": 5, "title": "t"}])),
        ];
        let grouped = run(&trace);
        let login = grouped.group("POST /auth/login").unwrap();
        assert_eq!(login.category, Category::Auth);
        assert!(login.produces.contains("accessToken"));
        assert!(login.produces.contains("user.id"));
        assert!(login.dependencies.is_empty());

        let projects = grouped.group("GET /projects").unwrap();
        assert!(projects.produces.contains("items[].projectId"));
        assert!(projects.dependencies.contains("POST /auth/login"));

        let tasks = grouped.group("GET /tasks").unwrap();
        assert!(tasks.consumes.contains("projectId"));
        assert!(tasks.dependencies.contains("GET /projects"));
        assert!(tasks.dependencies.contains("POST /auth/login"));
        assert!(!tasks.dependencies.contains("GET /tasks"));
        assert_eq!(tasks.response_summary.as_deref(), Some("array[1]"));
    }

    #[test]
    fn graphql_groups_by_operation_across_methods() {
        let trace = vec![
            CapturedExchange::new("GET", "/graphql?operationName=Feed&extensions=%7B%7D"),
            CapturedExchange::new("POST", "/graphql")
                .with_request_json(json!({"operationName": "Feed", "variables": {"cursor": "c"}})),
            CapturedExchange::new("POST", "/graphql")
                .with_request_json(json!({"operationName": "Feed", "variables": {}})),
            CapturedExchange::new("POST", "/graphql").with_request_json(
                json!({"operationName": "LikePost", "query": "mutation LikePost { like }", "variables": {"postId": "x1"}}),
            ),
        ];
        let grouped = run(&trace);
        assert_eq!(grouped.groups.len(), 2);
        let feed = grouped.group("POST /graphql#Feed").unwrap();
        assert_eq!(feed.example_count, 3);
        assert_eq!(feed.category, Category::Read);
        let like = grouped.group("POST /graphql#LikePost").unwrap();
        assert_eq!(like.category, Category::Write);
        assert!(like.consumes.contains("variables.postId"));
        assert_eq!(like.description, "Run the LikePost GraphQL mutation");
    }

    #[test]
    fn summaries() {
        assert_eq!(summarize_value(&json!([1, 2, 3])), "array[3]");
        assert_eq!(summarize_value(&json!({"b": 1, "a": 2})), "object{a,b}");
        assert_eq!(
            summarize_value(&json!({"a":1,"b":1,"c":1,"d":1,"e":1,"f":1,"g":1})),
            "object{a,b,c,d,e,f,…}"
        );
        assert_eq!(summarize_value(&json!("x")), "string");
    }
}
