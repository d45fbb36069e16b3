//! Provider conversation standards.
//!
//! Each dialect knows how to append new turns onto stored history, how to
//! repair the structural problems its provider rejects, and how to flatten
//! tool blocks into text for requests that carry no tool definitions.
//! The dialect is declared by the caller once; nothing here sniffs shapes
//! to guess which provider a history belongs to.

pub mod anthropic;
pub mod bedrock;
pub mod gemini;
pub mod openai;
pub(crate) mod repair;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::ContentRules;
use crate::error::ConversationError;
use crate::policy::RetentionPolicy;
use crate::strip::strip_with;
use crate::value::Value;

pub use anthropic::AnthropicConversation;
pub use bedrock::BedrockConversation;
pub use gemini::GeminiConversation;
pub use openai::OpenAiConversation;

/// Tool payloads flattened into text are clipped to this many characters.
pub const TOOL_TEXT_MAX_CHARS: usize = 500;

/// Conversation wire dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Bedrock Converse `{messages, system}`
    Bedrock,
    /// OpenAI chat message array (also Groq, Azure Foundry, xAI)
    #[serde(rename = "openai")]
    OpenAi,
    /// Gemini `Content[]` (Google AI Studio, Vertex AI)
    Gemini,
    /// Claude messages `{messages, system}` (Anthropic, Vertex AI)
    Claude,
}

impl Dialect {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    pub fn spec(&self) -> &'static dyn ConversationSpec {
        match self {
            Self::Bedrock => &BedrockConversation,
            Self::OpenAi => &OpenAiConversation,
            Self::Gemini => &GeminiConversation,
            Self::Claude => &AnthropicConversation,
        }
    }

    /// Histories stored as bare arrays (no root object for metadata).
    pub fn is_array_shaped(&self) -> bool {
        matches!(self, Self::OpenAi | Self::Gemini)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Dialect {
    type Err = ConversationError;

    /// Maps provider ids onto the dialect their chat API speaks.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bedrock" | "amazon-bedrock" => Ok(Self::Bedrock),
            "openai" | "groq" | "azure" | "azure_foundry" | "azure-foundry" | "xai"
            | "openai-compatible" => Ok(Self::OpenAi),
            "gemini" | "google" | "vertexai" | "google-vertex" => Ok(Self::Gemini),
            "claude" | "anthropic" | "vertexai-claude" | "anthropic-vertex" => Ok(Self::Claude),
            other => Err(ConversationError::UnknownDialect(other.to_string())),
        }
    }
}

/// Per-dialect conversation merging and repair.
pub trait ConversationSpec: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Classifier used by the stripping, truncation and heartbeat passes.
    fn content_rules(&self) -> &'static dyn ContentRules;

    /// History of a conversation with no turns yet.
    fn empty_history(&self) -> Value;

    /// Coerce a loaded history into this dialect's shape.
    ///
    /// Object dialects wrap a bare message array as `{"messages": [...]}`;
    /// array dialects lift the list out of `messages` (or Gemini `contents`).
    /// Anything else is returned unchanged.
    fn normalize_history(&self, history: Value) -> Value {
        let dialect = self.dialect();
        match history {
            Value::Null => self.empty_history(),
            Value::Array(messages) if !dialect.is_array_shaped() => {
                tracing::debug!(%dialect, count = messages.len(), "Wrapped bare message array");
                Value::object([("messages", Value::Array(messages))])
            }
            Value::Object(map) if dialect.is_array_shaped() => {
                let listed = map
                    .get("contents")
                    .or_else(|| map.get("messages"))
                    .and_then(Value::as_array)
                    .cloned();
                let messages = match listed {
                    Some(items) => items,
                    None if map.contains_key("role") => vec![Value::Object(map)],
                    None => return Value::Object(map),
                };
                tracing::debug!(%dialect, count = messages.len(), "Unwrapped message object");
                Value::Array(messages)
            }
            other => other,
        }
    }

    /// Append `incoming` onto `existing` and repair the result.
    fn update_conversation(&self, existing: &Value, incoming: &Value) -> Value;

    /// Fix structural problems the provider would reject.
    fn repair(&self, history: &Value) -> Value;

    /// Flatten tool-call and tool-result blocks into descriptive text.
    fn tools_to_text(&self, history: &Value) -> Value;

    /// Strip or retain this dialect's media blocks.
    fn strip_media(&self, history: &Value, policy: &RetentionPolicy) -> Value {
        strip_with(history, policy, self.content_rules())
    }
}

/// Clip to `max` characters, marking the cut with an ellipsis.
pub(crate) fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn tool_call_text(name: &str, arguments: &Value) -> String {
    let arguments = match arguments {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    format!("[Tool call: {name}({})]", clip(&arguments, TOOL_TEXT_MAX_CHARS))
}

pub(crate) fn tool_result_text(content: &str) -> String {
    format!("[Tool result: {}]", clip(content, TOOL_TEXT_MAX_CHARS))
}

pub(crate) fn interrupted_text(tool_name: &str) -> String {
    format!("[Tool interrupted: {tool_name} did not return a result before the turn ended]")
}

/// Best-effort plain text of a content value: a string, or the text-like
/// blocks of an array joined by newlines.
pub(crate) fn collect_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                Value::String(s) => Some(s.clone()),
                _ => block
                    .get_str("text")
                    .map(str::to_string)
                    .or_else(|| block.get("json").map(Value::to_string)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Message list of an incoming value: an array of messages, an object with
/// `messages`, or a single message object.
pub(crate) fn incoming_messages(incoming: &Value) -> Vec<Value> {
    match incoming {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("messages") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => Vec::new(),
            None if map.contains_key("role") => vec![incoming.clone()],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

pub(crate) fn role_of(message: &Value) -> Option<&str> {
    message.get_str("role")
}

/// Rewrite every block of every message's `content_key` array.
pub(crate) fn map_message_blocks<F>(messages: &[Value], content_key: &str, f: F) -> Vec<Value>
where
    F: Fn(&Value) -> Value,
{
    messages
        .iter()
        .map(|message| match message.get(content_key).and_then(Value::as_array) {
            Some(blocks) => repair::with_field(
                message,
                content_key,
                Value::Array(blocks.iter().map(&f).collect()),
            ),
            None => message.clone(),
        })
        .collect()
}

/// Concatenate two optional array-or-scalar values into one array.
/// `None` when both sides are absent.
pub(crate) fn concat_optional(
    existing: Option<&Value>,
    incoming: Option<&Value>,
    to_blocks: fn(&Value) -> Vec<Value>,
) -> Option<Value> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (Some(a), Some(b)) => {
            let mut blocks = to_blocks(a);
            blocks.extend(to_blocks(b));
            Some(Value::Array(blocks))
        }
    }
}
