//! Stripping engine.
//!
//! Replaces media blocks with placeholders once a retention policy expires,
//! and otherwise keeps them in a JSON-safe form. Placeholders replace the
//! whole block: a provider rejects a media block whose payload is missing.

use crate::classify::{BedrockContent, ContentRules, IMAGE_PLACEHOLDER, InlineBase64Content};
use crate::codec::box_bytes;
use crate::meta::META_KEY;
use crate::policy::RetentionPolicy;
use crate::value::Value;

/// Strip (or box) Bedrock image/document/video blocks and bare byte buffers.
///
/// Retained blocks keep their shape with boxed bytes, so the result is
/// always free of raw buffers.
pub fn strip_binary(tree: &Value, policy: &RetentionPolicy) -> Value {
    strip_with(tree, policy, &BedrockContent)
}

/// Strip OpenAI data-URL images, Gemini inline data and Claude base64 blocks.
pub fn strip_base64_images(tree: &Value, policy: &RetentionPolicy) -> Value {
    strip_with(tree, policy, &InlineBase64Content)
}

/// Strip the media blocks recognized by `rules`.
pub fn strip_with(tree: &Value, policy: &RetentionPolicy, rules: &dyn ContentRules) -> Value {
    let strip = policy.should_strip(tree);
    tracing::trace!(
        strip,
        keep_for_turns = %policy.keep_for_turns,
        "Applying media retention policy"
    );
    strip_node(tree, strip, rules)
}

fn strip_node(node: &Value, strip: bool, rules: &dyn ContentRules) -> Value {
    match node {
        Value::Bytes(bytes) if rules.handles_raw_binary() => {
            if strip {
                Value::from(IMAGE_PLACEHOLDER)
            } else {
                box_bytes(bytes)
            }
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| strip_node(item, strip, rules))
                .collect(),
        ),
        Value::Object(map) => {
            if let Some(kind) = rules.classify_block(node) {
                return if strip {
                    rules.placeholder_for(kind, node)
                } else {
                    rules.retain_block(node)
                };
            }
            Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let value = if key == META_KEY {
                            value.clone()
                        } else {
                            strip_node(value, strip, rules)
                        };
                        (key.clone(), value)
                    })
                    .collect(),
            )
        }
        other => other.clone(),
    }
}
