//! OpenAI chat completions conversation standard.
//!
//! History is a bare message array. Tool calls live in the assistant
//! message's `tool_calls` list and each is answered by its own
//! `{"role": "tool", "tool_call_id", "content"}` message.

use std::collections::HashSet;

use super::{
    ConversationSpec, Dialect, collect_text, incoming_messages, interrupted_text, role_of,
    tool_call_text, tool_result_text,
};
use crate::classify::{ContentRules, OpenAiContent, typed_text_block};
use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiConversation;

fn tool_calls_of(message: &Value) -> &[Value] {
    message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn call_name(call: &Value) -> &str {
    call.pointer("/function/name")
        .and_then(Value::as_str)
        .unwrap_or("tool")
}

fn is_tool_message(message: &Value) -> bool {
    matches!(role_of(message), Some("tool" | "function"))
}

fn interrupted_tool_message(id: &str, name: &str) -> Value {
    Value::object([
        ("role", Value::from("tool")),
        ("tool_call_id", Value::from(id)),
        ("content", Value::String(interrupted_text(name))),
    ])
}

/// Add `tool` messages for calls the following messages never answered.
///
/// Synthesized messages go right after the run of tool messages that
/// follows the assistant message. Calls whose run reaches the end of the
/// history are left alone.
pub fn repair_orphaned_tool_calls(messages: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len());
    let mut synthesized = 0usize;
    let mut i = 0usize;

    while i < messages.len() {
        let message = &messages[i];
        out.push(message.clone());
        i += 1;

        if role_of(message) != Some("assistant") || tool_calls_of(message).is_empty() {
            continue;
        }

        let mut answered = HashSet::new();
        while i < messages.len() && is_tool_message(&messages[i]) {
            if let Some(id) = messages[i].get_str("tool_call_id") {
                answered.insert(id.to_string());
            }
            out.push(messages[i].clone());
            i += 1;
        }
        if i == messages.len() {
            continue;
        }

        for call in tool_calls_of(message) {
            let Some(id) = call.get_str("id") else {
                continue;
            };
            if !answered.contains(id) {
                out.push(interrupted_tool_message(id, call_name(call)));
                synthesized += 1;
            }
        }
    }

    if synthesized > 0 {
        tracing::warn!(
            synthesized,
            "Synthesized tool messages for interrupted tool calls"
        );
    }
    out
}

/// Append `incoming` messages onto the `existing` array.
pub fn update_conversation(existing: &Value, incoming: &Value) -> Value {
    let mut messages = existing.as_array().cloned().unwrap_or_default();
    messages.extend(incoming_messages(incoming));
    Value::Array(repair_orphaned_tool_calls(&messages))
}

fn flatten_assistant_tool_calls(message: &Value) -> Value {
    let calls: Vec<String> = tool_calls_of(message)
        .iter()
        .map(|call| {
            let arguments = call.pointer("/function/arguments").cloned().unwrap_or_default();
            tool_call_text(call_name(call), &arguments)
        })
        .collect();

    let mut map: Map = message.as_object().cloned().unwrap_or_default();
    map.remove("tool_calls");
    let content = match map.remove("content") {
        Some(Value::Array(mut blocks)) => {
            blocks.extend(calls.into_iter().map(typed_text_block));
            Value::Array(blocks)
        }
        Some(Value::String(text)) if !text.is_empty() => {
            Value::String(std::iter::once(text).chain(calls).collect::<Vec<_>>().join("\n"))
        }
        _ => Value::String(calls.join("\n")),
    };
    map.insert("content".to_string(), content);
    Value::Object(map)
}

/// Replace `tool_calls` and `tool` messages with plain text.
pub fn tools_to_text(conversation: &Value) -> Value {
    let Some(messages) = conversation.as_array() else {
        return conversation.clone();
    };
    let messages = messages
        .iter()
        .map(|message| {
            if is_tool_message(message) {
                let content = message.get("content").cloned().unwrap_or_default();
                Value::object([
                    ("role", Value::from("user")),
                    ("content", Value::String(tool_result_text(&collect_text(&content)))),
                ])
            } else if !tool_calls_of(message).is_empty() {
                flatten_assistant_tool_calls(message)
            } else if message.get("tool_calls").is_some() {
                let mut map = message.as_object().cloned().unwrap_or_default();
                map.remove("tool_calls");
                Value::Object(map)
            } else {
                message.clone()
            }
        })
        .collect();
    Value::Array(messages)
}

impl ConversationSpec for OpenAiConversation {
    fn dialect(&self) -> Dialect {
        Dialect::OpenAi
    }

    fn content_rules(&self) -> &'static dyn ContentRules {
        &OpenAiContent
    }

    fn empty_history(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn update_conversation(&self, existing: &Value, incoming: &Value) -> Value {
        update_conversation(existing, incoming)
    }

    fn repair(&self, history: &Value) -> Value {
        match history.as_array() {
            Some(messages) => Value::Array(repair_orphaned_tool_calls(messages)),
            None => history.clone(),
        }
    }

    fn tools_to_text(&self, history: &Value) -> Value {
        tools_to_text(history)
    }
}
