//! Shared tree walk for text-field rewrites.

use crate::classify::ContentRules;
use crate::meta::META_KEY;
use crate::value::Value;

/// Rebuild `node`, replacing text fields for which `rewrite` returns `Some`.
///
/// The reserved metadata key is copied through untouched.
pub(crate) fn rewrite_text_fields<F>(node: &Value, rules: &dyn ContentRules, rewrite: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match node {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rewrite_text_fields(item, rules, rewrite))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match value {
                        _ if key == META_KEY => value.clone(),
                        Value::String(text) if rules.is_text_field(map, key) => rewrite(text)
                            .map(Value::String)
                            .unwrap_or_else(|| value.clone()),
                        _ => rewrite_text_fields(value, rules, rewrite),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
