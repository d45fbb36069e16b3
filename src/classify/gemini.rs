//! Gemini `Content.parts` inline data.
//!
//! `{"inlineData": {"mimeType": ..., "data": "<base64>"}}`. Parts carry no
//! type tag, so only payloads longer than [`MIN_INLINE_DATA_LEN`]
//! characters count as strippable media.

use super::{ContentRules, MediaKind, text_block};
use crate::value::Value;

/// Inline payloads must be strictly longer than this to be strippable.
pub const MIN_INLINE_DATA_LEN: usize = 1000;

fn inline_data(block: &Value) -> Option<&Value> {
    block.get("inlineData").or_else(|| block.get("inline_data"))
}

pub fn is_gemini_inline_data(block: &Value) -> bool {
    inline_data(block)
        .and_then(|blob| blob.get_str("data"))
        .is_some_and(|data| data.len() > MIN_INLINE_DATA_LEN)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiContent;

impl ContentRules for GeminiContent {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        if !is_gemini_inline_data(block) {
            return None;
        }
        let mime_type = inline_data(block)
            .and_then(|blob| blob.get_str("mimeType").or_else(|| blob.get_str("mime_type")));
        Some(MediaKind::from_mime_type(mime_type))
    }

    fn placeholder_for(&self, kind: MediaKind, _block: &Value) -> Value {
        text_block(kind.placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_payloads_are_not_media() {
        let short = Value::from(json!({
            "inlineData": { "mimeType": "image/png", "data": "A".repeat(MIN_INLINE_DATA_LEN) }
        }));
        let long = Value::from(json!({
            "inlineData": { "mimeType": "image/png", "data": "A".repeat(MIN_INLINE_DATA_LEN + 1) }
        }));
        assert_eq!(GeminiContent.classify_block(&short), None);
        assert_eq!(GeminiContent.classify_block(&long), Some(MediaKind::Image));
    }

    #[test]
    fn kind_follows_mime_type() {
        let pdf = Value::from(json!({
            "inline_data": { "mime_type": "application/pdf", "data": "A".repeat(2000) }
        }));
        let video = Value::from(json!({
            "inlineData": { "mimeType": "video/mp4", "data": "A".repeat(2000) }
        }));
        assert_eq!(GeminiContent.classify_block(&pdf), Some(MediaKind::Document));
        assert_eq!(GeminiContent.classify_block(&video), Some(MediaKind::Video));
    }

    #[test]
    fn file_data_is_never_media() {
        let file = Value::from(json!({
            "fileData": { "mimeType": "image/png", "fileUri": "gs://bucket/a.png" }
        }));
        assert_eq!(GeminiContent.classify_block(&file), None);
    }
}
