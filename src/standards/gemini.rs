//! Gemini conversation standard.
//!
//! History is a bare `Content[]` array (`{"role": "user" | "model", "parts": [...]}`).
//! Gemini accepts a model turn whose `functionCall` parts were never answered,
//! so repair leaves the history as it is.

use super::{
    ConversationSpec, Dialect, collect_text, incoming_messages, map_message_blocks,
    tool_call_text, tool_result_text,
};
use crate::classify::{ContentRules, GeminiContent, text_block};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiConversation;

/// Contents of an incoming prompt: an array, a single `Content`, or a
/// request-shaped object with `contents`.
fn incoming_contents(incoming: &Value) -> Vec<Value> {
    match incoming.get("contents").and_then(Value::as_array) {
        Some(contents) => contents.clone(),
        None => incoming_messages(incoming),
    }
}

/// Append `incoming` contents onto the `existing` array.
pub fn update_conversation(existing: &Value, incoming: &Value) -> Value {
    let mut contents = existing.as_array().cloned().unwrap_or_default();
    contents.extend(incoming_contents(incoming));
    Value::Array(contents)
}

fn function_part_text(part: &Value) -> Option<String> {
    if let Some(call) = part
        .get("functionCall")
        .or_else(|| part.get("function_call"))
    {
        let name = call.get_str("name").unwrap_or("tool");
        let args = call.get("args").cloned().unwrap_or_default();
        return Some(tool_call_text(name, &args));
    }
    let response = part
        .get("functionResponse")
        .or_else(|| part.get("function_response"))?;
    let payload = response.get("response").cloned().unwrap_or_default();
    let text = match payload.get("content").or_else(|| payload.get("output")) {
        Some(inner) => collect_text(inner),
        None => collect_text(&payload),
    };
    Some(tool_result_text(&text))
}

/// Replace `functionCall` / `functionResponse` parts with text parts.
pub fn tools_to_text(conversation: &Value) -> Value {
    let Some(contents) = conversation.as_array() else {
        return conversation.clone();
    };
    let contents = map_message_blocks(contents, "parts", |part| match function_part_text(part) {
        Some(text) => text_block(text),
        None => part.clone(),
    });
    Value::Array(contents)
}

impl ConversationSpec for GeminiConversation {
    fn dialect(&self) -> Dialect {
        Dialect::Gemini
    }

    fn content_rules(&self) -> &'static dyn ContentRules {
        &GeminiContent
    }

    fn empty_history(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn update_conversation(&self, existing: &Value, incoming: &Value) -> Value {
        update_conversation(existing, incoming)
    }

    fn repair(&self, history: &Value) -> Value {
        history.clone()
    }

    fn tools_to_text(&self, history: &Value) -> Value {
        tools_to_text(history)
    }
}
