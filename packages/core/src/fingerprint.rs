//! Stable identities for route variants.
//!
//! A fingerprint is the first 16 hex characters of
//! `sha256(METHOD | path | sorted,query,keys | body-signature)`. The body
//! signature deliberately covers only the top-level key set and simple type
//! tags of the request body, so minor data drift (different values, deeper
//! fields appearing) does not split a variant in two.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Fingerprint of one `(method, path, query-shape, body-shape)` variant.
pub fn fingerprint<S: AsRef<str>>(
    method: &str,
    normalized_path: &str,
    query_keys: &[S],
    body_schema_signature: &str,
) -> String {
    let mut keys: Vec<&str> = query_keys.iter().map(AsRef::as_ref).collect();
    keys.sort_unstable();
    let material = format!(
        "{}|{}|{}|{}",
        method.to_uppercase(),
        normalized_path,
        keys.join(","),
        body_schema_signature
    );
    let digest = hex::encode(Sha256::digest(material.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

/// Fingerprint with no query keys and no body shape. Always computable, and
/// the conservative join key when a more specific match fails.
pub fn basic_fingerprint(method: &str, normalized_path: &str) -> String {
    fingerprint::<&str>(method, normalized_path, &[], "")
}

/// Simple type tag of a JSON value, as used in body signatures.
pub fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deterministic shape string for a request body.
///
/// Objects serialise as canonical JSON of `{key: type-tag}`
/// (e.g. `{"id":"integer","name":"string"}`); any other value is just its
/// type tag; no body is the empty string.
pub fn body_schema_signature(body: Option<&Value>) -> String {
    match body {
        None => String::new(),
        Some(Value::Object(map)) => {
            let shape: BTreeMap<&str, &str> =
                map.iter().map(|(k, v)| (k.as_str(), type_tag(v))).collect();
            serde_jcs::to_string(&shape).unwrap_or_else(|_| "object".into())
        }
        Some(other) => type_tag(other).to_string(),
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sixteen_hex_chars_and_stable() {
        let a = fingerprint("get", "/users/{id}", &["b", "a"], "");
        let b = fingerprint("GET", "/users/{id}", &["a", "b"], "");
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn query_shape_and_body_shape_split_variants() {
        let plain = basic_fingerprint("GET", "/items");
        assert_ne!(plain, fingerprint("GET", "/items", &["page"], ""));
        assert_ne!(plain, fingerprint("GET", "/items", &[] as &[&str], "{}"));
        assert_eq!(plain, fingerprint::<String>("GET", "/items", &[], ""));
    }

    #[test]
    fn body_signature_ignores_values_and_order() {
        let a = body_schema_signature(Some(&json!({"name": "a", "id": 1, "tags": ["x"]})));
        let b = body_schema_signature(Some(&json!({"id": 99, "tags": [], "name": "zzz"})));
        assert_eq!(a, b);
        assert_eq!(a, r#"{"id":"integer","name":"string","tags":"array"}"#);
    }

    #[test]
    fn body_signature_for_non_objects() {
        assert_eq!(body_schema_signature(None), "");
        assert_eq!(body_schema_signature(Some(&json!([1, 2]))), "array");
        assert_eq!(body_schema_signature(Some(&json!(1.5))), "number");
    }
}
