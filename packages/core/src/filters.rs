//! Heuristic pattern tables.
//!
//! Every classification the pipeline makes from names alone lives here as an
//! explicit static table: which fields look like identifiers, which paths
//! are authentication routes, which headers carry credentials, and which
//! exchanges are browser noise rather than API traffic. These are
//! heuristics over naming conventions, nothing more; each table is tested on
//! its own so that tuning one does not silently shift the others.

use std::sync::LazyLock;

use regex::Regex;

// --- identifier fields ---------------------------------------------------------

/// Leaf field names treated as identifiers (producers in responses,
/// consumers in requests).
static IDENTIFIER_FIELD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^id$",
        r"(?i)^uuid$",
        r"(?i)^guid$",
        // camelCase suffix: userId, orgID
        r"[a-z0-9](?:Id|ID)$",
        // snake/kebab suffix: user_id, session-id
        r"(?i)[_-]id$",
        // accessToken, refresh_token, csrfToken
        r"(?i)token$",
        // apiKey, idempotency_key
        r"(?i)key$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid identifier pattern"))
    .collect()
});

/// Whether a leaf field name looks like an identifier, token, or key.
///
/// Only the last component of a dotted path is considered; `[]` array
/// markers are ignored.
pub fn is_identifier_field(name: &str) -> bool {
    let leaf = leaf_name(name);
    !leaf.is_empty() && IDENTIFIER_FIELD_PATTERNS.iter().any(|re| re.is_match(leaf))
}

/// Last component of a dotted field path: `items[].id` -> `id`.
pub fn leaf_name(path: &str) -> &str {
    let last = path.rsplit('.').next().unwrap_or(path);
    last.trim_end_matches("[]")
}

// --- auth routes ---------------------------------------------------------------

/// Kind of authentication route, used to pick a fixed description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRoute {
    Logout,
    Refresh,
    Register,
    Login,
}

/// Checked in order against the lowercased path; first match wins.
static AUTH_ROUTE_PATTERNS: LazyLock<Vec<(Regex, AuthRoute)>> = LazyLock::new(|| {
    [
        (r"log-?out|sign-?out", AuthRoute::Logout),
        (r"refresh", AuthRoute::Refresh),
        (r"register|sign-?up", AuthRoute::Register),
        (r"log-?in|sign-?in|oauth|authenticate", AuthRoute::Login),
        (r"(?:^|/)(?:[a-z0-9]+[-_])?token(?:/|\.|$)", AuthRoute::Login),
        (r"(?:^|/)sessions?/?$|(?:^|/)session(?:/|$)", AuthRoute::Login),
    ]
    .into_iter()
    .map(|(p, kind)| (Regex::new(p).expect("invalid auth route pattern"), kind))
    .collect()
});

/// Classify a path as an authentication route, if it is one.
pub fn auth_route(path: &str) -> Option<AuthRoute> {
    let lower = path.to_lowercase();
    AUTH_ROUTE_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map(|(_, kind)| *kind)
}

// --- headers -------------------------------------------------------------------

/// Exact header names that carry credentials.
static AUTH_HEADER_NAMES: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "x-api-key",
    "api-key",
    "apikey",
    "x-auth-token",
    "x-access-token",
    "access-token",
    "x-csrf-token",
    "x-xsrf-token",
    "x-session-id",
    "x-amz-security-token",
    "x-goog-api-key",
    "x-rapidapi-key",
    "ocp-apim-subscription-key",
    "x-signature",
];

/// Substrings that mark a header as auth-like.
static AUTH_HEADER_FRAGMENTS: &[&str] = &[
    "auth", "token", "api-key", "apikey", "secret", "bearer", "jwt", "session", "csrf", "xsrf",
    "signature", "credential",
];

/// Common `x-` headers that match a fragment but never carry credentials.
static STANDARD_HEADERS: &[&str] = &[
    "x-requested-with",
    "x-request-id",
    "x-correlation-id",
    "x-trace-id",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-real-ip",
    "x-powered-by",
];

/// Whether a request or response header looks like it carries credentials.
pub fn is_auth_like_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.starts_with(':') || STANDARD_HEADERS.contains(&lower.as_str()) {
        return false;
    }
    AUTH_HEADER_NAMES.contains(&lower.as_str())
        || AUTH_HEADER_FRAGMENTS.iter().any(|f| lower.contains(f))
}

// --- traffic noise ---------------------------------------------------------------

static STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".mjs", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".avif", ".ico",
    ".woff", ".woff2", ".ttf", ".otf", ".eot", ".map", ".mp4", ".webm", ".mp3", ".wav",
];

static STATIC_PATH_PREFIXES: &[&str] = &[
    "/cdn-cgi/",
    "/_next/static/",
    "/__nextjs",
    "/sockjs-node/",
    "/favicon",
    "/manifest.json",
    "/robots.txt",
    "/sitemap",
    "/.well-known/",
    "/service-worker",
    "/sw.js",
];

/// Third-party hosts whose traffic is never the target API: analytics, ads,
/// consent banners, monitoring, CDNs, captchas.
static THIRD_PARTY_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "doubleclick.net",
    "googlesyndication.com",
    "gstatic.com",
    "fonts.googleapis.com",
    "mixpanel.com",
    "segment.io",
    "segment.com",
    "amplitude.com",
    "heapanalytics.com",
    "posthog.com",
    "plausible.io",
    "hotjar.com",
    "clarity.ms",
    "sentry.io",
    "fullstory.com",
    "logrocket.io",
    "datadoghq.com",
    "nr-data.net",
    "bugsnag.com",
    "launchdarkly.com",
    "intercom.io",
    "zendesk.com",
    "onetrust.com",
    "cookielaw.org",
    "facebook.net",
    "connect.facebook.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "cdn.jsdelivr.net",
    "unpkg.com",
    "cdnjs.cloudflare.com",
    "challenges.cloudflare.com",
    "recaptcha.net",
    "hcaptcha.com",
];

/// Whether a URL path points at a static asset or well-known browser file.
pub fn is_static_asset_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || STATIC_PATH_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Whether a host belongs to a known third-party service.
pub fn is_third_party_host(host: &str) -> bool {
    let lower = host.to_lowercase();
    THIRD_PARTY_DOMAINS
        .iter()
        .any(|d| lower == *d || lower.ends_with(&format!(".{d}")))
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let ct = content_type.to_lowercase();
    ct.contains("text/html") || ct.contains("application/xhtml")
}

// --- api likeness ----------------------------------------------------------------

/// Path fragments that mark a call as API traffic.
static API_PATH_MARKERS: &[&str] = &[
    "/api/", "/services/", "/v1/", "/v2/", "/v3/", "/graphql", "/rpc", "/query", "/mutation",
    "/auth", "/user", "/account", "/profile", "/order", "/data", "/tokens", "/markets",
    "/quote", "/swap",
];

/// Host fragments that mark a call as API traffic.
static API_HOST_MARKERS: &[&str] = &["api.", "service", "quote"];

/// Host prefixes of pre-production API deployments.
static API_HOST_PREFIXES: &[&str] = &["dev-", "staging-"];

static MUTATING_METHODS: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

pub fn is_json_content_type(content_type: &str) -> bool {
    let ct = content_type.to_lowercase();
    ct.contains("application/json") || ct.contains("text/json") || ct.contains("+json")
}

/// Whether a call looks like API traffic on its own: a JSON response, an
/// API-style path, a mutating method, or an API-style host.
pub fn is_api_like(method: &str, path: &str, host: Option<&str>, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(is_json_content_type) {
        return true;
    }
    if MUTATING_METHODS.contains(&method.to_uppercase().as_str()) {
        return true;
    }
    let path = path.to_lowercase();
    if API_PATH_MARKERS.iter().any(|m| path.contains(m)) {
        return true;
    }
    host.is_some_and(|h| {
        let h = h.to_lowercase();
        API_HOST_MARKERS.iter().any(|m| h.contains(m))
            || API_HOST_PREFIXES.iter().any(|p| h.starts_with(p))
    })
}

/// Last two labels of a host: `api.example.com` -> `example.com`.
pub fn root_domain(host: &str) -> String {
    let lower = host.to_lowercase();
    let labels: Vec<&str> = lower.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        lower
    }
}

// --- tests -------------------------------------------------------------------
