//! Webhook 请求体解码
//!
//! Registries send JSON (`application/json` or the distribution media type
//! `application/vnd.docker.distribution.events.v1+json`). Form-encoded bodies are
//! accepted too; bracketed keys such as `repository[repo_name]` or
//! `events[0][action]` are expanded into nested objects and arrays.

use serde_json::{Map, Value};
use thiserror::Error;

/// 请求体解码错误
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

/// Decode a request body according to its `Content-Type`.
///
/// A missing content type is treated as JSON.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, PayloadError> {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match media_type.as_str() {
        "" | "application/json" => Ok(serde_json::from_slice(body)?),
        "application/x-www-form-urlencoded" => decode_form(body),
        other if other.ends_with("+json") => Ok(serde_json::from_slice(body)?),
        other => Err(PayloadError::UnsupportedContentType(other.to_string())),
    }
}

/// 最大括号嵌套层数，超出部分合并为一个字面键（与 Express `qs` 相同）
const MAX_FORM_DEPTH: usize = 5;

fn decode_form(body: &[u8]) -> Result<Value, PayloadError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

    let mut root = Map::new();
    for (key, value) in pairs {
        insert_nested(&mut root, &split_key(&key), value);
    }

    Ok(into_arrays(Value::Object(root)))
}

/// `a[b][c]` -> `["a", "b", "c"]`. Keys with unbalanced brackets stay flat.
///
/// Past [`MAX_FORM_DEPTH`] brackets the remainder becomes one literal segment,
/// so `a[1][2][3][4][5][6][7]` ends in `"[6][7]"`.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        if segments.len() > MAX_FORM_DEPTH {
            segments.push(rest.to_string());
            return segments;
        }
        let Some(close) = inner.find(']') else {
            return vec![key.to_string()];
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

fn insert_nested(target: &mut Map<String, Value>, path: &[String], value: String) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };

    // `a[]=x` appends
    let key = if head.is_empty() {
        target.len().to_string()
    } else {
        head.clone()
    };

    if rest.is_empty() {
        target.insert(key, Value::String(value));
        return;
    }

    let entry = target
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_nested(child, rest, value);
    }
}

/// Objects keyed exactly `0..n` become arrays
fn into_arrays(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            let is_sequence =
                !map.is_empty() && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if is_sequence {
                let items = (0..map.len())
                    .map(|i| into_arrays(map.remove(&i.to_string()).unwrap_or(Value::Null)))
                    .collect();
                Value::Array(items)
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, into_arrays(v))).collect())
            }
        }
        other => other,
    }
}
