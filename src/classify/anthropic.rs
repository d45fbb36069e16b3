//! Anthropic (Claude) media blocks.
//!
//! `{"type": "image"|"document", "source": {"type": "base64", "media_type", "data"}}`.
//! URL and file sources are left alone.

use super::{ContentRules, MediaKind, typed_text_block};
use crate::value::{Map, Value};

pub fn is_anthropic_base64_block(block: &Value) -> bool {
    matches!(block.get_str("type"), Some("image" | "document"))
        && block.pointer("/source/type").and_then(Value::as_str) == Some("base64")
        && block.pointer("/source/data").is_some_and(|d| d.as_str().is_some())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicContent;

impl ContentRules for AnthropicContent {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        if !is_anthropic_base64_block(block) {
            return None;
        }
        match block.get_str("type") {
            Some("document") => Some(MediaKind::Document),
            _ => Some(MediaKind::Image),
        }
    }

    fn placeholder_for(&self, kind: MediaKind, _block: &Value) -> Value {
        typed_text_block(kind.placeholder())
    }

    /// Message `content` and `tool_result` `content` may be plain strings.
    fn is_text_field(&self, parent: &Map, key: &str) -> bool {
        if key == "text" {
            return true;
        }
        key == "content"
            && (parent.contains_key("role")
                || parent.get("type").and_then(Value::as_str) == Some("tool_result"))
    }
}
