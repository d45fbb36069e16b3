//! OpenAI chat content.
//!
//! Strippable: `{"type": "image_url", "image_url": {"url": "data:image/...;base64,..."}}`.
//! Remote (`http(s)://`) images are never strippable.

use super::{ContentRules, MediaKind, typed_text_block};
use crate::value::{Map, Value};

/// `data:image/` prefix and a `;base64,` marker.
pub fn is_base64_image_data_url(url: &str) -> bool {
    url.starts_with("data:image/") && url.contains(";base64,")
}

pub fn is_openai_data_url_image(block: &Value) -> bool {
    block.get_str("type") == Some("image_url")
        && block
            .pointer("/image_url/url")
            .and_then(Value::as_str)
            .is_some_and(is_base64_image_data_url)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiContent;

impl ContentRules for OpenAiContent {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        is_openai_data_url_image(block).then_some(MediaKind::Image)
    }

    fn placeholder_for(&self, kind: MediaKind, _block: &Value) -> Value {
        typed_text_block(kind.placeholder())
    }

    /// `content` is a text field on messages (`{"role", "content": "..."}`).
    fn is_text_field(&self, parent: &Map, key: &str) -> bool {
        key == "text" || (key == "content" && parent.contains_key("role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_url_detection() {
        assert!(is_base64_image_data_url("data:image/png;base64,AAAA"));
        assert!(!is_base64_image_data_url("data:text/plain;base64,AAAA"));
        assert!(!is_base64_image_data_url("data:image/svg+xml,<svg/>"));
        assert!(!is_base64_image_data_url("https://x/y.jpg"));
    }

    #[test]
    fn only_data_url_images_classify() {
        let remote = Value::from(json!({
            "type": "image_url", "image_url": { "url": "https://x/y.jpg" }
        }));
        let inline = Value::from(json!({
            "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA", "detail": "low" }
        }));
        assert_eq!(OpenAiContent.classify_block(&remote), None);
        assert_eq!(OpenAiContent.classify_block(&inline), Some(MediaKind::Image));
    }
}
