//! Amazon Bedrock Converse conversation standard.
//!
//! History shape: `{"messages": [{"role", "content": [block...]}], "system": [{"text"}]}`.
//! Tool calls are `{"toolUse": {"toolUseId", "name", "input"}}` blocks in
//! assistant messages, answered by `{"toolResult": {"toolUseId", "content"}}`
//! blocks in the following user message.

use std::collections::HashSet;

use super::repair::{ToolCall, ToolProtocol, with_field};
use super::{
    ConversationSpec, Dialect, collect_text, concat_optional, incoming_messages, interrupted_text,
    map_message_blocks, tool_call_text, tool_result_text,
};
use crate::classify::{BedrockContent, ContentRules, text_block};
use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct BedrockConversation;

struct BedrockTools;

fn blocks_of(message: &Value) -> &[Value] {
    message
        .get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

impl ToolProtocol for BedrockTools {
    fn tool_calls(&self, message: &Value) -> Vec<ToolCall> {
        blocks_of(message)
            .iter()
            .filter_map(|block| {
                let tool_use = block.get("toolUse")?;
                Some(ToolCall {
                    id: tool_use.get_str("toolUseId")?.to_string(),
                    name: tool_use.get_str("name").unwrap_or("tool").to_string(),
                })
            })
            .collect()
    }

    fn answered_ids(&self, message: &Value) -> HashSet<String> {
        blocks_of(message)
            .iter()
            .filter_map(|block| block.pointer("/toolResult/toolUseId")?.as_str())
            .map(str::to_string)
            .collect()
    }

    fn interrupted_result(&self, call: &ToolCall) -> Value {
        Value::object([(
            "toolResult",
            Value::object([
                ("toolUseId", Value::from(call.id.as_str())),
                (
                    "content",
                    Value::from(vec![text_block(interrupted_text(&call.name))]),
                ),
                ("status", Value::from("error")),
            ]),
        )])
    }

    fn content_blocks(&self, message: &Value) -> Vec<Value> {
        match message.get("content") {
            Some(Value::Array(blocks)) => blocks.clone(),
            Some(Value::String(text)) => vec![text_block(text.as_str())],
            _ => Vec::new(),
        }
    }
}

fn system_blocks(system: &Value) -> Vec<Value> {
    match system {
        Value::Array(blocks) => blocks.clone(),
        Value::String(text) => vec![text_block(text.as_str())],
        _ => Vec::new(),
    }
}

/// Synthesize results for tool calls left unanswered by an interrupted turn.
pub fn repair_orphaned_tool_use(messages: &[Value]) -> Vec<Value> {
    repair_orphaned_tool_use_counted(messages).0
}

fn repair_orphaned_tool_use_counted(messages: &[Value]) -> (Vec<Value>, usize) {
    super::repair::repair_orphaned_tool_use(messages, &BedrockTools)
}

/// Append `incoming` messages and system blocks onto `existing`.
pub fn update_conversation(existing: &Value, incoming: &Value) -> Value {
    let mut merged: Map = existing.as_object().cloned().unwrap_or_default();

    let mut messages: Vec<Value> = existing
        .get("messages")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    messages.extend(incoming_messages(incoming));

    if let Some(system) =
        concat_optional(existing.get("system"), incoming.get("system"), system_blocks)
    {
        merged.insert("system".to_string(), system);
    }
    merged.insert(
        "messages".to_string(),
        Value::Array(repair_orphaned_tool_use(&messages)),
    );
    Value::Object(merged)
}

/// Replace `toolUse` / `toolResult` blocks with text blocks.
pub fn tools_to_text(conversation: &Value) -> Value {
    let Some(messages) = conversation.get("messages").and_then(Value::as_array) else {
        return conversation.clone();
    };
    let messages = map_message_blocks(messages, "content", |block| {
        if let Some(tool_use) = block.get("toolUse") {
            let name = tool_use.get_str("name").unwrap_or("tool");
            let input = tool_use.get("input").cloned().unwrap_or_default();
            text_block(tool_call_text(name, &input))
        } else if let Some(result) = block.get("toolResult") {
            let content = result.get("content").cloned().unwrap_or_default();
            text_block(tool_result_text(&collect_text(&content)))
        } else {
            block.clone()
        }
    });
    with_field(conversation, "messages", Value::Array(messages))
}

impl ConversationSpec for BedrockConversation {
    fn dialect(&self) -> Dialect {
        Dialect::Bedrock
    }

    fn content_rules(&self) -> &'static dyn ContentRules {
        &BedrockContent
    }

    fn empty_history(&self) -> Value {
        Value::object([("messages", Value::Array(Vec::new()))])
    }

    fn update_conversation(&self, existing: &Value, incoming: &Value) -> Value {
        update_conversation(existing, incoming)
    }

    fn repair(&self, history: &Value) -> Value {
        match history.get("messages").and_then(Value::as_array) {
            Some(messages) => with_field(
                history,
                "messages",
                Value::Array(repair_orphaned_tool_use(messages)),
            ),
            None => history.clone(),
        }
    }

    fn tools_to_text(&self, history: &Value) -> Value {
        tools_to_text(history)
    }
}
