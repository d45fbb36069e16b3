//! Content classification.
//!
//! Each dialect recognizes its own media blocks by shape only: the presence
//! and type of specific nested fields. Live (`Bytes`) and boxed
//! (`{"_base64"}`) payloads classify the same way, because a history may
//! arrive from storage in either state. Unrecognized shapes are never
//! classified.

pub mod anthropic;
pub mod bedrock;
pub mod gemini;
pub mod openai;

pub use anthropic::{AnthropicContent, is_anthropic_base64_block};
pub use bedrock::{
    BedrockContent, is_bedrock_document_block, is_bedrock_image_block, is_bedrock_video_block,
};
pub use gemini::{GeminiContent, MIN_INLINE_DATA_LEN, is_gemini_inline_data};
pub use openai::{OpenAiContent, is_base64_image_data_url, is_openai_data_url_image};

use crate::codec::serialize_binary;
use crate::value::{Map, Value};

pub const IMAGE_PLACEHOLDER: &str = "[Image removed from conversation history]";
pub const DOCUMENT_PLACEHOLDER: &str = "[Document removed from conversation history]";
pub const VIDEO_PLACEHOLDER: &str = "[Video removed from conversation history]";

/// Kind of a strippable media block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Document,
    Video,
}

impl MediaKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Image => IMAGE_PLACEHOLDER,
            Self::Document => DOCUMENT_PLACEHOLDER,
            Self::Video => VIDEO_PLACEHOLDER,
        }
    }

    /// `image/*` (or unknown) -> Image, `video/*` -> Video, anything else -> Document.
    pub fn from_mime_type(mime_type: Option<&str>) -> Self {
        match mime_type.map(str::to_ascii_lowercase) {
            None => Self::Image,
            Some(m) if m.starts_with("image/") => Self::Image,
            Some(m) if m.starts_with("video/") => Self::Video,
            Some(_) => Self::Document,
        }
    }
}

/// Per-dialect classification capability used by the tree walkers.
pub trait ContentRules: Send + Sync {
    /// Media kind of `block`, if it is a strippable media block.
    fn classify_block(&self, block: &Value) -> Option<MediaKind>;

    /// Replacement for a stripped block of `kind`.
    fn placeholder_for(&self, kind: MediaKind, block: &Value) -> Value;

    /// Form kept in history when the block is retained.
    fn retain_block(&self, block: &Value) -> Value {
        serialize_binary(block)
    }

    /// Whether `parent[key]` is a text-bearing field when it holds a string.
    fn is_text_field(&self, _parent: &Map, key: &str) -> bool {
        key == "text"
    }

    /// Whether bare byte buffers outside a recognized block are stripped/boxed.
    fn handles_raw_binary(&self) -> bool {
        false
    }
}

/// `{"text": ...}` block (Bedrock, Gemini).
pub(crate) fn text_block(text: impl Into<String>) -> Value {
    Value::object([("text", Value::String(text.into()))])
}

/// `{"type": "text", "text": ...}` block (OpenAI, Claude).
pub(crate) fn typed_text_block(text: impl Into<String>) -> Value {
    Value::object([
        ("type", Value::from("text")),
        ("text", Value::String(text.into())),
    ])
}

static INLINE_BASE64_RULES: [&dyn ContentRules; 3] =
    [&OpenAiContent, &GeminiContent, &AnthropicContent];

static ALL_RULES: [&dyn ContentRules; 4] = [
    &BedrockContent,
    &OpenAiContent,
    &GeminiContent,
    &AnthropicContent,
];

fn first_match(rules: &[&dyn ContentRules], block: &Value) -> Option<(usize, MediaKind)> {
    rules
        .iter()
        .enumerate()
        .find_map(|(i, r)| r.classify_block(block).map(|kind| (i, kind)))
}

/// Inline base64 media of the OpenAI, Gemini and Claude dialects.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineBase64Content;

impl ContentRules for InlineBase64Content {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        first_match(&INLINE_BASE64_RULES, block).map(|(_, kind)| kind)
    }

    fn placeholder_for(&self, kind: MediaKind, block: &Value) -> Value {
        match first_match(&INLINE_BASE64_RULES, block) {
            Some((i, _)) => INLINE_BASE64_RULES[i].placeholder_for(kind, block),
            None => text_block(kind.placeholder()),
        }
    }

    fn is_text_field(&self, parent: &Map, key: &str) -> bool {
        INLINE_BASE64_RULES
            .iter()
            .any(|r| r.is_text_field(parent, key))
    }
}

/// Union of every dialect, used when the dialect is not known.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyDialectContent;

impl ContentRules for AnyDialectContent {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        first_match(&ALL_RULES, block).map(|(_, kind)| kind)
    }

    fn placeholder_for(&self, kind: MediaKind, block: &Value) -> Value {
        match first_match(&ALL_RULES, block) {
            Some((i, _)) => ALL_RULES[i].placeholder_for(kind, block),
            None => text_block(kind.placeholder()),
        }
    }

    fn is_text_field(&self, parent: &Map, key: &str) -> bool {
        ALL_RULES.iter().any(|r| r.is_text_field(parent, key))
    }

    fn handles_raw_binary(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn long_b64() -> String {
        "A".repeat(MIN_INLINE_DATA_LEN + 1)
    }

    #[test]
    fn mime_type_mapping() {
        assert_eq!(MediaKind::from_mime_type(None), MediaKind::Image);
        assert_eq!(MediaKind::from_mime_type(Some("IMAGE/PNG")), MediaKind::Image);
        assert_eq!(MediaKind::from_mime_type(Some("video/mp4")), MediaKind::Video);
        assert_eq!(
            MediaKind::from_mime_type(Some("application/pdf")),
            MediaKind::Document
        );
    }

    #[test]
    fn composite_uses_matching_dialect_placeholder() {
        let openai = Value::from(json!({
            "type": "image_url",
            "image_url": { "url": "data:image/png;base64,AAAA" }
        }));
        let gemini = Value::from(json!({
            "inlineData": { "mimeType": "image/png", "data": long_b64() }
        }));

        let rules = InlineBase64Content;
        let kind = rules.classify_block(&openai).unwrap();
        assert_eq!(
            rules.placeholder_for(kind, &openai),
            Value::from(json!({ "type": "text", "text": IMAGE_PLACEHOLDER }))
        );
        let kind = rules.classify_block(&gemini).unwrap();
        assert_eq!(
            rules.placeholder_for(kind, &gemini),
            Value::from(json!({ "text": IMAGE_PLACEHOLDER }))
        );
    }

    #[test]
    fn inline_base64_ignores_bedrock_bytes() {
        let mut block = Value::from(json!({
            "image": { "format": "png", "source": { "bytes": null } }
        }));
        *block.pointer_mut("/image/source/bytes").unwrap() = Value::Bytes(vec![1, 2]);
        assert_eq!(InlineBase64Content.classify_block(&block), None);
        assert_eq!(AnyDialectContent.classify_block(&block), Some(MediaKind::Image));
    }

    #[test]
    fn text_fields_cover_all_dialects() {
        let openai_msg = Value::from(json!({ "role": "user", "content": "x" }));
        let claude_result = Value::from(json!({ "type": "tool_result", "content": "x" }));
        let plain = Value::from(json!({ "content": "x" }));

        let rules = AnyDialectContent;
        assert!(rules.is_text_field(openai_msg.as_object().unwrap(), "content"));
        assert!(rules.is_text_field(claude_result.as_object().unwrap(), "content"));
        assert!(!rules.is_text_field(plain.as_object().unwrap(), "content"));
        assert!(rules.is_text_field(plain.as_object().unwrap(), "text"));
    }
}
