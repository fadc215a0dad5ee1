//! Best-effort decoding of a [`CapturedExchange`] into the pieces every
//! stage needs: normalised method, host, path, query pairs, and JSON bodies.
//!
//! Decoding never fails loudly. A URL that cannot be parsed yields `None`
//! (the exchange is skipped); a body that is not JSON is simply absent.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use url::Url;

use crate::types::CapturedExchange;

/// Origin used to resolve relative capture URLs such as `/me?x=1`.
static RELATIVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://relative.invalid/").expect("invalid base url"));

/// A decoded view over one borrowed exchange.
#[derive(Debug, Clone)]
pub struct ParsedExchange<'a> {
    /// Position in the trace as supplied by the caller.
    pub index: usize,
    pub source: &'a CapturedExchange,
    /// Uppercased method.
    pub method: String,
    /// `None` when the capture URL was relative.
    pub host: Option<String>,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub request_json: Option<Cow<'a, Value>>,
    pub response_json: Option<Cow<'a, Value>>,
    /// `Some` for GraphQL traffic; the inner value is the operation name
    /// when one was sent.
    pub graphql: Option<Option<String>>,
}

impl<'a> ParsedExchange<'a> {
    /// Decode an exchange. Returns `None` when the URL is unusable.
    pub fn parse(index: usize, source: &'a CapturedExchange) -> Option<Self> {
        let (url, relative) = match Url::parse(source.url.trim()) {
            Ok(url) => (url, false),
            Err(_) => (RELATIVE_BASE.join(source.url.trim()).ok()?, true),
        };
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let method = source.method.trim().to_uppercase();
        if method.is_empty() {
            return None;
        }

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        let request_json = decode_request_body(source);
        let response_json = match &source.response_json {
            Some(v) => Some(Cow::Borrowed(v)),
            None => source.response_body.as_deref().and_then(parse_json).map(Cow::Owned),
        };

        let path = url.path().to_string();
        let graphql = is_graphql_path(&path).then(|| {
            query
                .iter()
                .find(|(k, _)| k == "operationName")
                .map(|(_, v)| v.clone())
                .or_else(|| {
                    request_json
                        .as_deref()
                        .and_then(|b| b.get("operationName"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .filter(|op| !op.is_empty())
        });

        Some(Self {
            index,
            source,
            method,
            host: if relative {
                None
            } else {
                url.host_str().map(str::to_lowercase)
            },
            path,
            query,
            request_json,
            response_json,
            graphql,
        })
    }

    /// Sorted, de-duplicated query keys.
    pub fn query_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.query.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn response_content_type(&self) -> Option<&str> {
        header(&self.source.response_headers, "content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.source.status)
    }
}

/// Case-insensitive header lookup.
pub fn header<'m>(headers: &'m BTreeMap<String, String>, name: &str) -> Option<&'m str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parse an RFC 3339 capture timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

fn is_graphql_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with("/graphql") || lower.contains("/graphql/")
}

fn parse_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn decode_request_body(source: &CapturedExchange) -> Option<Cow<'_, Value>> {
    if let Some(v) = &source.request_json {
        return Some(Cow::Borrowed(v));
    }
    let text = source.request_body.as_deref()?;
    if let Some(v) = parse_json(text) {
        return Some(Cow::Owned(v));
    }
    let is_form = header(&source.request_headers, "content-type")
        .is_some_and(|ct| ct.to_lowercase().contains("application/x-www-form-urlencoded"));
    if !is_form {
        return None;
    }
    let fields: Map<String, Value> = url::form_urlencoded::parse(text.trim().as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    (!fields.is_empty()).then(|| Cow::Owned(Value::Object(fields)))
}

// --- tests -------------------------------------------------------------------
