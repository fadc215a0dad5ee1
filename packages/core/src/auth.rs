//! Authentication style and service identity of a trace.
//!
//! Nothing here reads or stores credentials. Header values are inspected
//! only to classify the scheme (`Bearer`, `Basic`, ...) and to strip that
//! prefix before a value is hashed by the graph builder.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filters::is_auth_like_header;

/// How the traced API authenticates its callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum AuthScheme {
    /// `Authorization: Bearer ...`
    Bearer,
    /// `Authorization: Basic ...`
    Basic,
    /// A dedicated API-key header, e.g. `x-api-key`.
    ApiKey(String),
    /// A session or CSRF token header.
    Session(String),
    /// A credential-bearing cookie.
    Cookie(String),
    /// Some other auth-like header.
    Custom(String),
    /// No credentials observed.
    None,
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthScheme::Bearer => write!(f, "bearer token"),
            AuthScheme::Basic => write!(f, "basic auth"),
            AuthScheme::ApiKey(h) => write!(f, "api key ({h})"),
            AuthScheme::Session(h) => write!(f, "session token ({h})"),
            AuthScheme::Cookie(c) => write!(f, "cookie ({c})"),
            AuthScheme::Custom(h) => write!(f, "custom header ({h})"),
            AuthScheme::None => write!(f, "none"),
        }
    }
}

/// Cookie names that usually hold a session or token.
static AUTH_COOKIE_FRAGMENTS: &[&str] = &["session", "sid", "token", "auth", "jwt"];

/// Classify the auth scheme from the union of auth-like request headers and
/// request cookies seen across a trace. Header names are compared
/// lowercased; the first matching rule wins.
pub fn detect_auth_scheme(
    headers: &BTreeMap<String, String>,
    cookies: &BTreeMap<String, String>,
) -> AuthScheme {
    let lowered: BTreeMap<String, &str> = headers
        .iter()
        .filter(|(name, _)| is_auth_like_header(name))
        .map(|(name, value)| (name.to_lowercase(), value.as_str()))
        .collect();

    if let Some(value) = lowered.get("authorization") {
        let v = value.trim_start().to_lowercase();
        if v.starts_with("bearer ") {
            return AuthScheme::Bearer;
        }
        if v.starts_with("basic ") {
            return AuthScheme::Basic;
        }
    }
    if let Some(name) = lowered
        .keys()
        .find(|h| h.contains("api-key") || h.contains("apikey") || h.ends_with("-key"))
    {
        return AuthScheme::ApiKey(name.clone());
    }
    if let Some(name) = lowered
        .keys()
        .find(|h| h.contains("session") || h.contains("csrf") || h.contains("xsrf"))
    {
        return AuthScheme::Session(name.clone());
    }
    if let Some(name) = lowered.keys().next() {
        return AuthScheme::Custom(name.clone());
    }
    if let Some(name) = cookies.keys().find(|c| {
        let lower = c.to_lowercase();
        AUTH_COOKIE_FRAGMENTS.iter().any(|f| lower.contains(f))
    }) {
        return AuthScheme::Cookie(name.clone());
    }
    AuthScheme::None
}

/// Remove a leading auth scheme (`Bearer`, `Basic`, `Token`, ...) from a
/// credential header value so the bare token can be matched against the
/// response field that issued it.
pub fn strip_auth_scheme(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) if is_scheme_word(scheme) => rest.trim_start(),
        _ => trimmed,
    }
}

fn is_scheme_word(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "bearer" | "basic" | "token" | "jwt" | "digest" | "apikey" | "dpop"
    )
}

static TLD_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(com|org|net|co|io|ai|app|dev|xyz|gg|fm|tv|me|so|to|sg)\.?$")
        .expect("invalid tld regex")
});

/// Derive a short service name from a host: `api.github.com` -> `github`.
pub fn derive_service_name(host: &str) -> String {
    let lower = host.to_lowercase();
    let mut name = lower.as_str();
    for prefix in ["www.", "api.", "app.", "m."] {
        name = name.strip_prefix(prefix).unwrap_or(name);
    }
    let name = TLD_SUFFIX_RE.replace(name, "").replace('.', "-");
    if name.is_empty() {
        "unknown-api".into()
    } else {
        name
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bearer_and_basic() {
        let none = BTreeMap::new();
        assert_eq!(
            detect_auth_scheme(&headers(&[("Authorization", "Bearer abc")]), &none),
            AuthScheme::Bearer
        );
        assert_eq!(
            detect_auth_scheme(&headers(&[("authorization", "Basic dXNlcjpwdw==")]), &none),
            AuthScheme::Basic
        );
    }

    #[test]
    fn api_key_session_and_custom_headers() {
        let none = BTreeMap::new();
        assert_eq!(
            detect_auth_scheme(&headers(&[("X-Api-Key", "k")]), &none),
            AuthScheme::ApiKey("x-api-key".into())
        );
        assert_eq!(
            detect_auth_scheme(&headers(&[("x-csrf-token", "t")]), &none),
            AuthScheme::Session("x-csrf-token".into())
        );
        assert_eq!(
            detect_auth_scheme(&headers(&[("x-auth-token", "t")]), &none),
            AuthScheme::Custom("x-auth-token".into())
        );
    }

    #[test]
    fn cookies_and_nothing() {
        let none = BTreeMap::new();
        let cookies = headers(&[("theme", "dark"), ("connect.sid", "s:abc")]);
        assert_eq!(
            detect_auth_scheme(&none, &cookies),
            AuthScheme::Cookie("connect.sid".into())
        );
        assert_eq!(
            detect_auth_scheme(&headers(&[("Accept", "*/*")]), &none),
            AuthScheme::None
        );
    }

    #[test]
    fn strips_known_schemes_only() {
        assert_eq!(strip_auth_scheme("Bearer abc123"), "abc123");
        assert_eq!(strip_auth_scheme("  token   xyz "), "xyz");
        assert_eq!(strip_auth_scheme("abc123"), "abc123");
        assert_eq!(strip_auth_scheme("two words"), "two words");
    }

    #[test]
    fn service_names() {
        assert_eq!(derive_service_name("api.github.com"), "github");
        assert_eq!(derive_service_name("www.stripe.com"), "stripe");
        assert_eq!(derive_service_name("app.linear.app"), "linear");
        assert_eq!(derive_service_name("eu.api-gw.example.co"), "eu-api-gw-example");
        assert_eq!(derive_service_name("localhost"), "localhost");
    }
}
