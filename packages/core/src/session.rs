//! One analysis run over a captured trace.
//!
//! [`AnalysisSession`] owns the only mutable state the pipeline has: the
//! route normalizer's observations. Every call to [`AnalysisSession::run`]
//! starts from fresh state, so re-analysing an extended trace is just
//! another `run` over the whole thing.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::analyzer::EndpointAnalyzer;
use crate::auth::{derive_service_name, detect_auth_scheme, AuthScheme};
use crate::config::AnalysisConfig;
use crate::exchange::{parse_timestamp, ParsedExchange};
use crate::filters::{
    is_api_like, is_html_content_type, is_static_asset_path, is_third_party_host, root_domain,
};
use crate::graph::GraphBuilder;
use crate::order::order_groups;
use crate::route::RouteNormalizer;
use crate::types::{CapturedExchange, DependencyGraph, EndpointGroup, RouteTemplate};

/// Service name used when no call carried an absolute URL.
pub const UNKNOWN_SERVICE: &str = "unknown-api";

/// Everything learned from one trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Short name derived from the dominant API host.
    pub service: String,
    /// Origin of the dominant API host, e.g. `https://api.example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub auth_scheme: AuthScheme,
    /// Endpoint groups in execution order.
    pub groups: Vec<EndpointGroup>,
    pub graph: DependencyGraph,
}

impl Analysis {
    pub fn group(&self, key: &str) -> Option<&EndpointGroup> {
        self.groups.iter().find(|g| g.key == key)
    }
}

/// Pipeline state for one run.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    normalizer: RouteNormalizer,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            normalizer: RouteNormalizer::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Route observations from the most recent run.
    pub fn normalizer(&self) -> &RouteNormalizer {
        &self.normalizer
    }

    /// Analyse `trace`. Never fails: unusable exchanges are skipped and an
    /// empty or all-noise trace yields an empty analysis.
    pub fn run(&mut self, trace: &[CapturedExchange]) -> Analysis {
        self.normalizer = RouteNormalizer::new();

        let mut calls: Vec<ParsedExchange<'_>> = Vec::with_capacity(trace.len());
        let mut skipped = 0usize;
        let mut noise = 0usize;
        for (index, exchange) in chronological(trace) {
            let Some(call) = ParsedExchange::parse(index, exchange) else {
                tracing::debug!(index, url = %exchange.url, method = %exchange.method, "skipping unusable exchange");
                skipped += 1;
                continue;
            };
            if self.config.filter_noise && is_noise(&call) {
                tracing::debug!(index, path = %call.path, "dropping noise");
                noise += 1;
                continue;
            }
            calls.push(call);
        }
        if self.config.filter_noise {
            let before = calls.len();
            retain_api_traffic(&mut calls);
            noise += before - calls.len();
        }

        for call in &calls {
            self.normalizer.observe(&call.method, &call.path);
        }
        let templates: Vec<RouteTemplate> = calls
            .iter()
            .map(|c| self.normalizer.template(&c.method, &c.path))
            .collect();

        let grouped = EndpointAnalyzer::new(&self.config).analyze(&calls, &templates);
        let graph = GraphBuilder::new(&self.config).build(
            &calls,
            &templates,
            &grouped.call_groups,
            &grouped.groups,
        );
        let mut groups = grouped.groups;
        order_groups(&mut groups);

        let (service, base_url) = service_identity(&calls);
        let auth_scheme = trace_auth_scheme(&calls);

        tracing::info!(
            calls = calls.len(),
            skipped,
            noise,
            groups = groups.len(),
            edges = graph.edges.len(),
            service = %service,
            "analysis complete"
        );

        Analysis {
            service,
            base_url,
            auth_scheme,
            groups,
            graph,
        }
    }
}

/// Trace order as time order. When every exchange has a parseable
/// timestamp the trace is stable-sorted by it; otherwise the input order
/// stands.
fn chronological(trace: &[CapturedExchange]) -> Vec<(usize, &CapturedExchange)> {
    let mut indexed: Vec<(usize, &CapturedExchange)> = trace.iter().enumerate().collect();
    let stamps: Option<Vec<_>> = trace
        .iter()
        .map(|ex| ex.timestamp.as_deref().and_then(parse_timestamp))
        .collect();
    if let Some(stamps) = stamps {
        indexed.sort_by_key(|(i, _)| stamps[*i]);
    }
    indexed
}

/// Static assets, third-party trackers and CDNs, and HTML page loads.
pub fn is_noise(call: &ParsedExchange<'_>) -> bool {
    if is_static_asset_path(&call.path) {
        return true;
    }
    if call.host.as_deref().is_some_and(is_third_party_host) {
        return true;
    }
    call.method == "GET" && call.response_content_type().is_some_and(is_html_content_type)
}

/// Whether a call is API traffic on its own evidence: see
/// [`is_api_like`], or a structured JSON body in either direction.
pub fn is_api_call(call: &ParsedExchange<'_>) -> bool {
    let structured = |v: &Value| v.is_object() || v.is_array();
    call.response_json.as_deref().is_some_and(structured)
        || call.request_json.as_deref().is_some_and(structured)
        || is_api_like(
            &call.method,
            &call.path,
            call.host.as_deref(),
            call.response_content_type(),
        )
}

/// Keep API calls plus any other call on the same root domain as one.
/// Relative URLs share a single implicit domain. A trace with no API call
/// at all comes out empty.
fn retain_api_traffic(calls: &mut Vec<ParsedExchange<'_>>) {
    let targets: HashSet<Option<String>> = calls
        .iter()
        .filter(|c| is_api_call(c))
        .map(|c| c.host.as_deref().map(root_domain))
        .collect();
    calls.retain(|c| {
        let keep = targets.contains(&c.host.as_deref().map(root_domain));
        if !keep {
            tracing::debug!(index = c.index, path = %c.path, "dropping non-api call");
        }
        keep
    });
}

/// Most frequent origin among absolute URLs; ties go to the first seen.
fn service_identity(calls: &[ParsedExchange<'_>]) -> (String, Option<String>) {
    let mut counts: HashMap<(String, String), (usize, usize)> = HashMap::new();
    for (position, call) in calls.iter().enumerate() {
        let Some(host) = &call.host else { continue };
        let Ok(url) = Url::parse(call.source.url.trim()) else { continue };
        let origin = url.origin().ascii_serialization();
        counts
            .entry((host.clone(), origin))
            .or_insert((0, position))
            .0 += 1;
    }
    let dominant = counts
        .into_iter()
        .max_by(|(_, (ca, pa)), (_, (cb, pb))| ca.cmp(cb).then_with(|| pb.cmp(pa)));
    match dominant {
        Some(((host, origin), _)) => (derive_service_name(&host), Some(origin)),
        None => (UNKNOWN_SERVICE.into(), None),
    }
}

fn trace_auth_scheme(calls: &[ParsedExchange<'_>]) -> AuthScheme {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    let mut cookies: BTreeMap<String, String> = BTreeMap::new();
    for call in calls {
        for (name, value) in &call.source.request_headers {
            headers
                .entry(name.to_lowercase())
                .or_insert_with(|| value.clone());
        }
        for (name, value) in &call.source.request_cookies {
            cookies.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
    detect_auth_scheme(&headers, &cookies)
}

// --- tests -------------------------------------------------------------------
