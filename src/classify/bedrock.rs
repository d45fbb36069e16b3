//! Bedrock Converse media blocks.
//!
//! `{"image"|"document"|"video": {"format": ..., "source": {"bytes": <bytes|boxed>}}}`

use super::{ContentRules, MediaKind, text_block};
use crate::codec::is_binary_payload;
use crate::value::Value;

fn has_binary_source(block: &Value, key: &str) -> bool {
    block
        .get(key)
        .and_then(|media| media.pointer("/source/bytes"))
        .is_some_and(is_binary_payload)
}

pub fn is_bedrock_image_block(block: &Value) -> bool {
    has_binary_source(block, "image")
}

pub fn is_bedrock_document_block(block: &Value) -> bool {
    has_binary_source(block, "document")
}

pub fn is_bedrock_video_block(block: &Value) -> bool {
    has_binary_source(block, "video")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BedrockContent;

impl ContentRules for BedrockContent {
    fn classify_block(&self, block: &Value) -> Option<MediaKind> {
        if is_bedrock_image_block(block) {
            Some(MediaKind::Image)
        } else if is_bedrock_document_block(block) {
            Some(MediaKind::Document)
        } else if is_bedrock_video_block(block) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    fn placeholder_for(&self, kind: MediaKind, _block: &Value) -> Value {
        text_block(kind.placeholder())
    }

    fn handles_raw_binary(&self) -> bool {
        true
    }
}
