//! Heartbeat filter.
//!
//! An orchestration layer may inject `<heartbeat>...</heartbeat>` status
//! messages into a conversation. They are meant for the current round only
//! and are replaced by a placeholder once their retention expires.

use crate::classify::{AnyDialectContent, ContentRules};
use crate::policy::RetentionPolicy;
use crate::value::Value;
use crate::walk::rewrite_text_fields;

pub const HEARTBEAT_OPEN_TAG: &str = "<heartbeat>";
pub const HEARTBEAT_CLOSE_TAG: &str = "</heartbeat>";
pub const HEARTBEAT_PLACEHOLDER: &str = "[Heartbeat removed from conversation history]";

/// Both tags must be present: the text (ignoring surrounding whitespace)
/// starts with the open tag and ends with the close tag.
pub fn is_heartbeat(text: &str) -> bool {
    let text = text.trim();
    text.len() >= HEARTBEAT_OPEN_TAG.len() + HEARTBEAT_CLOSE_TAG.len()
        && text.starts_with(HEARTBEAT_OPEN_TAG)
        && text.ends_with(HEARTBEAT_CLOSE_TAG)
}

/// Replace heartbeat texts in any dialect.
///
/// Use [`RetentionPolicy::heartbeat_default`] for the usual one-turn window.
pub fn strip_heartbeats(tree: &Value, policy: &RetentionPolicy) -> Value {
    strip_heartbeats_with(tree, policy, &AnyDialectContent)
}

/// Replace heartbeat texts in the text fields recognized by `rules`.
pub fn strip_heartbeats_with(
    tree: &Value,
    policy: &RetentionPolicy,
    rules: &dyn ContentRules,
) -> Value {
    if !policy.should_strip(tree) {
        return tree.clone();
    }
    rewrite_text_fields(tree, rules, &|text| {
        is_heartbeat(text).then(|| HEARTBEAT_PLACEHOLDER.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{META_KEY, TurnContext, set_meta};
    use serde_json::json;

    #[test]
    fn requires_both_tags() {
        assert!(is_heartbeat("<heartbeat>...</heartbeat>"));
        assert!(is_heartbeat("  <heartbeat>status: ok</heartbeat>\n"));
        assert!(!is_heartbeat("<heartbeat>partial tag without close"));
        assert!(!is_heartbeat("missing open</heartbeat>"));
        assert!(!is_heartbeat("prefix <heartbeat>x</heartbeat>"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored_but_other_text_is_not() {
        let tree = Value::from(json!([
            { "role": "user", "content": "\n  <heartbeat>idle 30s</heartbeat>  \n" },
            { "role": "user", "content": "<heartbeat>idle 30s</heartbeat> still there?" },
            { "role": "user", "content": "note: <heartbeat>idle 30s</heartbeat>" }
        ]));
        let out = strip_heartbeats(&tree, &RetentionPolicy::forced());
        assert_eq!(out[0]["content"].as_str(), Some(HEARTBEAT_PLACEHOLDER));
        assert_eq!(out[1], tree[1]);
        assert_eq!(out[2], tree[2]);
    }

    #[test]
    fn forced_policy_strips_complete_heartbeats_only() {
        let tree = Value::from(json!([
            { "role": "user", "content": [{ "text": "<heartbeat>...</heartbeat>" }] },
            { "role": "user", "content": [{ "text": "<heartbeat>partial tag without close" }] }
        ]));
        let out = strip_heartbeats(&tree, &RetentionPolicy::forced());
        assert_eq!(
            out.pointer("/0/content/0/text").and_then(Value::as_str),
            Some(HEARTBEAT_PLACEHOLDER)
        );
        assert_eq!(
            out.pointer("/1/content/0/text").and_then(Value::as_str),
            Some("<heartbeat>partial tag without close")
        );
    }

    #[test]
    fn default_policy_keeps_heartbeats_for_one_turn() {
        let base = Value::from(json!({
            "messages": [{ "role": "user", "content": "<heartbeat>tick</heartbeat>" }]
        }));
        let policy = RetentionPolicy::heartbeat_default();

        let turn0 = set_meta(&base, TurnContext::new(0));
        assert_eq!(strip_heartbeats(&turn0, &policy), turn0);

        let turn1 = set_meta(&base, TurnContext::new(1));
        let out = strip_heartbeats(&turn1, &policy);
        assert_eq!(
            out.pointer("/messages/0/content").and_then(Value::as_str),
            Some(HEARTBEAT_PLACEHOLDER)
        );
        assert_eq!(out.get(META_KEY), turn1.get(META_KEY));
    }

    #[test]
    fn covers_gemini_parts_and_openai_blocks() {
        let tree = Value::from(json!([
            { "role": "model", "parts": [{ "text": "<heartbeat>a</heartbeat>" }] },
            { "role": "user", "content": [{ "type": "text", "text": "<heartbeat>b</heartbeat>" }] }
        ]));
        let out = strip_heartbeats(&tree, &RetentionPolicy::forced());
        assert_eq!(out.pointer("/0/parts/0/text").and_then(Value::as_str), Some(HEARTBEAT_PLACEHOLDER));
        assert_eq!(out.pointer("/1/content/0/text").and_then(Value::as_str), Some(HEARTBEAT_PLACEHOLDER));
    }
}
