//! Recursive redaction of client-declared JSON
//!
//! Walks an untyped `serde_json::Value` tree and drops every object entry
//! whose key matches a caller-supplied predicate, at any depth and inside
//! arrays. All other structure is preserved.

use serde_json::{Map, Value};
use thiserror::Error;

/// Keys never stored by the gateway (compared case-insensitively)
pub const SENSITIVE_KEYS: [&str; 6] = ["password", "pass", "passwd", "pwd", "secret", "token"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Body nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// Default denylist predicate
pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}

/// Strip denylisted keys using [`is_sensitive_key`]
pub fn strip_sensitive(value: Value, max_depth: usize) -> Result<Value, SanitizeError> {
    strip_keys(value, &is_sensitive_key, max_depth)
}

/// Strip every object key for which `deny` returns true.
///
/// Containers nested deeper than `max_depth` fail the whole walk; scalars
/// never count towards the depth.
pub fn strip_keys<F>(value: Value, deny: &F, max_depth: usize) -> Result<Value, SanitizeError>
where
    F: Fn(&str) -> bool,
{
    walk(value, deny, 0, max_depth)
}

fn walk<F>(value: Value, deny: &F, depth: usize, max_depth: usize) -> Result<Value, SanitizeError>
where
    F: Fn(&str) -> bool,
{
    match value {
        Value::Array(items) => {
            check_depth(depth, max_depth)?;
            items
                .into_iter()
                .map(|item| walk(item, deny, depth + 1, max_depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Value::Object(map) => {
            check_depth(depth, max_depth)?;
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                if deny(&key) {
                    continue;
                }
                out.insert(key, walk(item, deny, depth + 1, max_depth)?);
            }
            Ok(Value::Object(out))
        }
        scalar => Ok(scalar),
    }
}

fn check_depth(depth: usize, max_depth: usize) -> Result<(), SanitizeError> {
    if depth >= max_depth {
        return Err(SanitizeError::TooDeep(max_depth));
    }
    Ok(())
}
