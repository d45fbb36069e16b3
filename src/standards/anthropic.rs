//! Anthropic (Claude) messages conversation standard.
//!
//! History shape: `{"messages": [{"role", "content"}], "system": ...}` where
//! `content` and `system` are either strings or typed block arrays. The
//! messages API is the strictest of the dialects: every `tool_use` must be
//! answered in the very next user message, that user message must carry all
//! results of the turn (results first), and text blocks may not be empty.

use std::collections::HashSet;

use super::repair::{ToolCall, ToolProtocol, with_field};
use super::{
    ConversationSpec, Dialect, collect_text, concat_optional, incoming_messages, interrupted_text,
    map_message_blocks, role_of, tool_call_text, tool_result_text,
};
use crate::classify::{AnthropicContent, ContentRules, typed_text_block};
use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicConversation;

struct AnthropicTools;

fn content_blocks(message: &Value) -> Vec<Value> {
    match message.get("content") {
        Some(Value::Array(blocks)) => blocks.clone(),
        Some(Value::String(text)) => vec![typed_text_block(text.as_str())],
        _ => Vec::new(),
    }
}

fn blocks_of_type<'a>(message: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    message
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(move |block| block.get_str("type") == Some(kind))
}

fn is_tool_result(block: &Value) -> bool {
    block.get_str("type") == Some("tool_result")
}

impl ToolProtocol for AnthropicTools {
    fn tool_calls(&self, message: &Value) -> Vec<ToolCall> {
        blocks_of_type(message, "tool_use")
            .filter_map(|block| {
                Some(ToolCall {
                    id: block.get_str("id")?.to_string(),
                    name: block.get_str("name").unwrap_or("tool").to_string(),
                })
            })
            .collect()
    }

    fn answered_ids(&self, message: &Value) -> HashSet<String> {
        blocks_of_type(message, "tool_result")
            .filter_map(|block| block.get_str("tool_use_id"))
            .map(str::to_string)
            .collect()
    }

    fn interrupted_result(&self, call: &ToolCall) -> Value {
        Value::object([
            ("type", Value::from("tool_result")),
            ("tool_use_id", Value::from(call.id.as_str())),
            (
                "content",
                Value::from(vec![typed_text_block(interrupted_text(&call.name))]),
            ),
            ("is_error", Value::Bool(true)),
        ])
    }

    fn content_blocks(&self, message: &Value) -> Vec<Value> {
        content_blocks(message)
    }
}

fn system_blocks(system: &Value) -> Vec<Value> {
    content_blocks(&Value::object([("content", system.clone())]))
}

fn is_blank_text_block(block: &Value) -> bool {
    block.get_str("type") == Some("text")
        && block.get_str("text").is_none_or(|text| text.trim().is_empty())
}

/// Drop whitespace-only text blocks, then messages left without content.
///
/// Interrupted streams can leave `{"type": "text", "text": ""}` behind,
/// which the messages API rejects.
pub fn sanitize_empty_text_blocks(messages: &[Value]) -> Vec<Value> {
    let mut dropped_blocks = 0usize;
    let mut dropped_messages = 0usize;

    let sanitized: Vec<Value> = messages
        .iter()
        .filter_map(|message| match message.get("content") {
            Some(Value::String(text)) if text.trim().is_empty() => {
                dropped_messages += 1;
                None
            }
            Some(Value::Array(blocks)) => {
                let kept: Vec<Value> = blocks
                    .iter()
                    .filter(|block| !is_blank_text_block(block))
                    .cloned()
                    .collect();
                dropped_blocks += blocks.len() - kept.len();
                if kept.is_empty() {
                    dropped_messages += 1;
                    None
                } else {
                    Some(with_field(message, "content", Value::Array(kept)))
                }
            }
            _ => Some(message.clone()),
        })
        .collect();

    if dropped_blocks > 0 || dropped_messages > 0 {
        tracing::warn!(
            dropped_blocks,
            dropped_messages,
            "Dropped empty text blocks from Claude history"
        );
    }
    sanitized
}

/// Merge runs of adjacent user messages into one.
///
/// `tool_result` blocks move to the front of the merged content; the first
/// message's other fields are kept.
pub fn merge_consecutive_user_messages(messages: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(messages.len());
    let mut merged = 0usize;

    for message in messages {
        let previous_is_user = out.last().is_some_and(|m| role_of(m) == Some("user"));
        if previous_is_user && role_of(message) == Some("user") {
            if let Some(previous) = out.last_mut() {
                let mut blocks = content_blocks(previous);
                blocks.extend(content_blocks(message));
                let (mut ordered, rest): (Vec<Value>, Vec<Value>) =
                    blocks.into_iter().partition(is_tool_result);
                ordered.extend(rest);
                *previous = with_field(previous, "content", Value::Array(ordered));
                merged += 1;
            }
            continue;
        }
        out.push(message.clone());
    }

    if merged > 0 {
        tracing::debug!(merged, "Merged consecutive user messages");
    }
    out
}

/// Synthesize `tool_result` blocks for interrupted `tool_use` calls.
pub fn repair_orphaned_tool_use(messages: &[Value]) -> Vec<Value> {
    super::repair::repair_orphaned_tool_use(messages, &AnthropicTools).0
}

/// Sanitize, merge and repair a Claude message list.
pub fn repair_messages(messages: &[Value]) -> Vec<Value> {
    let sanitized = sanitize_empty_text_blocks(messages);
    let merged = merge_consecutive_user_messages(&sanitized);
    repair_orphaned_tool_use(&merged)
}

/// Append `incoming` messages and system prompt onto `existing`.
pub fn update_conversation(existing: &Value, incoming: &Value) -> Value {
    let mut conversation: Map = existing.as_object().cloned().unwrap_or_default();

    let mut messages: Vec<Value> = existing
        .get("messages")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    messages.extend(incoming_messages(incoming));

    if let Some(system) =
        concat_optional(existing.get("system"), incoming.get("system"), system_blocks)
    {
        conversation.insert("system".to_string(), system);
    }
    conversation.insert(
        "messages".to_string(),
        Value::Array(repair_messages(&messages)),
    );
    Value::Object(conversation)
}

/// Replace `tool_use` / `tool_result` blocks with text blocks.
pub fn tools_to_text(conversation: &Value) -> Value {
    let Some(messages) = conversation.get("messages").and_then(Value::as_array) else {
        return conversation.clone();
    };
    let messages = map_message_blocks(messages, "content", |block| match block.get_str("type") {
        Some("tool_use") => {
            let name = block.get_str("name").unwrap_or("tool");
            let input = block.get("input").cloned().unwrap_or_default();
            typed_text_block(tool_call_text(name, &input))
        }
        Some("tool_result") => {
            let content = block.get("content").cloned().unwrap_or_default();
            typed_text_block(tool_result_text(&collect_text(&content)))
        }
        _ => block.clone(),
    });
    with_field(conversation, "messages", Value::Array(messages))
}

impl ConversationSpec for AnthropicConversation {
    fn dialect(&self) -> Dialect {
        Dialect::Claude
    }

    fn content_rules(&self) -> &'static dyn ContentRules {
        &AnthropicContent
    }

    fn empty_history(&self) -> Value {
        Value::object([("messages", Value::Array(Vec::new()))])
    }

    fn update_conversation(&self, existing: &Value, incoming: &Value) -> Value {
        update_conversation(existing, incoming)
    }

    fn repair(&self, history: &Value) -> Value {
        match history.get("messages").and_then(Value::as_array) {
            Some(messages) => with_field(history, "messages", Value::Array(repair_messages(messages))),
            None => history.clone(),
        }
    }

    fn tools_to_text(&self, history: &Value) -> Value {
        tools_to_text(history)
    }
}
