//! Orphaned tool-use repair shared by the block-based dialects.
//!
//! An assistant message whose tool calls have no result in the message
//! right after it was interrupted before tool execution finished. The
//! provider rejects that history, so each unanswered call gets a
//! placeholder result at the head of the next user message (a user
//! message is inserted when the next message is not one). A trailing
//! assistant message is left alone: its tools may still be running.

use std::collections::HashSet;

use super::role_of;
use crate::value::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolCall {
    pub id: String,
    pub name: String,
}

/// How a dialect encodes tool calls and tool results.
pub(crate) trait ToolProtocol {
    fn tool_calls(&self, message: &Value) -> Vec<ToolCall>;

    fn answered_ids(&self, message: &Value) -> HashSet<String>;

    fn interrupted_result(&self, call: &ToolCall) -> Value;

    /// The message's content as a block list.
    fn content_blocks(&self, message: &Value) -> Vec<Value>;

    fn user_message(&self, blocks: Vec<Value>) -> Value {
        Value::object([
            ("role", Value::from("user")),
            ("content", Value::Array(blocks)),
        ])
    }
}

/// Returns the repaired messages and the number of synthesized results.
pub(crate) fn repair_orphaned_tool_use(
    messages: &[Value],
    protocol: &dyn ToolProtocol,
) -> (Vec<Value>, usize) {
    let mut out = messages.to_vec();
    let mut synthesized = 0usize;
    let mut i = 0usize;

    while i + 1 < out.len() {
        if role_of(&out[i]) != Some("assistant") {
            i += 1;
            continue;
        }
        let calls = protocol.tool_calls(&out[i]);
        if calls.is_empty() {
            i += 1;
            continue;
        }

        let next_is_user = role_of(&out[i + 1]) == Some("user");
        let answered = if next_is_user {
            protocol.answered_ids(&out[i + 1])
        } else {
            HashSet::new()
        };
        let missing: Vec<Value> = calls
            .iter()
            .filter(|call| !answered.contains(&call.id))
            .map(|call| protocol.interrupted_result(call))
            .collect();
        if missing.is_empty() {
            i += 1;
            continue;
        }
        synthesized += missing.len();

        if next_is_user {
            let mut blocks = missing;
            blocks.extend(protocol.content_blocks(&out[i + 1]));
            if let Some(map) = out[i + 1].as_object_mut() {
                map.insert("content".to_string(), Value::Array(blocks));
            }
        } else {
            out.insert(i + 1, protocol.user_message(missing));
        }
        i += 2;
    }

    if synthesized > 0 {
        tracing::warn!(
            synthesized,
            "Synthesized tool results for interrupted tool calls"
        );
    }
    (out, synthesized)
}

/// Replace `key` of an object message, keeping its other fields.
pub(crate) fn with_field(message: &Value, key: &str, value: Value) -> Value {
    let mut map: Map = message.as_object().cloned().unwrap_or_default();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
