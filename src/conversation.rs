//! Conversation state at the storage boundary.
//!
//! A [`Conversation`] is the working form: the dialect's history tree (which
//! may hold live byte buffers) plus an explicit [`TurnContext`]. The stored
//! form is plain JSON: bytes boxed, and the turn counter written under the
//! reserved metadata key (inside an envelope for array histories).

use crate::codec::{deserialize_binary, serialize_binary};
use crate::error::Result;
use crate::meta::{TurnContext, set_meta, unwrap_history, wrap_history};
use crate::standards::{ConversationSpec, Dialect};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    dialect: Dialect,
    history: Value,
    turn: TurnContext,
}

impl Conversation {
    /// Empty conversation at turn 0.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            history: dialect.spec().empty_history(),
            turn: TurnContext::default(),
        }
    }

    /// Wrap `history`, coerced into the dialect's shape.
    pub fn with_history(dialect: Dialect, history: Value, turn: TurnContext) -> Self {
        let history = dialect.spec().normalize_history(history);
        Self {
            dialect,
            history,
            turn,
        }
    }

    /// Load a stored conversation.
    ///
    /// Accepts `Null` (new conversation), an object carrying the metadata
    /// key, the array envelope, or a bare array at turn 0.
    pub fn from_stored(dialect: Dialect, stored: &Value) -> Self {
        let (history, turn) = unwrap_history(stored);
        Self::with_history(dialect, history, turn)
    }

    pub fn from_json_str(dialect: Dialect, json: &str) -> Result<Self> {
        let stored: Value = serde_json::from_str(json)?;
        Ok(Self::from_stored(dialect, &stored))
    }

    /// JSON-safe stored form with the turn counter attached.
    pub fn to_stored(&self) -> Value {
        let history = serialize_binary(&self.history);
        if history.is_object() {
            set_meta(&history, self.turn)
        } else {
            wrap_history(history, self.turn)
        }
    }

    pub fn into_stored(self) -> Value {
        self.to_stored()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_stored())?)
    }

    /// History with boxed binary decoded, ready for a request builder.
    pub fn request_history(&self) -> Value {
        deserialize_binary(&self.history)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn spec(&self) -> &'static dyn ConversationSpec {
        self.dialect.spec()
    }

    pub fn history(&self) -> &Value {
        &self.history
    }

    pub fn into_history(self) -> Value {
        self.history
    }

    pub fn turn(&self) -> TurnContext {
        self.turn
    }

    pub fn turn_number(&self) -> u64 {
        self.turn.turn_number
    }

    /// Append messages and repair the result.
    pub fn append(&mut self, incoming: &Value) {
        self.history = self.spec().update_conversation(&self.history, incoming);
    }

    /// Copy with `history` replaced, keeping dialect and turn.
    pub fn map_history<F>(self, f: F) -> Self
    where
        F: FnOnce(&Value) -> Value,
    {
        let history = f(&self.history);
        Self { history, ..self }
    }

    /// Copy advanced to the next turn.
    pub fn next_turn(self) -> Self {
        Self {
            turn: self.turn.next(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::contains_raw_bytes;
    use crate::error::ConversationError;
    use crate::meta::{HISTORY_KEY, META_KEY};
    use serde_json::json;

    #[test]
    fn null_loads_as_new_conversation() {
        for dialect in [Dialect::Bedrock, Dialect::OpenAi, Dialect::Gemini, Dialect::Claude] {
            let conv = Conversation::from_stored(dialect, &Value::Null);
            assert_eq!(conv, Conversation::new(dialect));
            assert_eq!(conv.turn_number(), 0);
        }
    }

    #[test]
    fn object_history_stores_meta_at_root() {
        let history = Value::from(json!({ "messages": [{ "role": "user", "content": [{ "text": "hi" }] }] }));
        let conv = Conversation::with_history(Dialect::Bedrock, history.clone(), TurnContext::new(4));
        let stored = conv.to_stored();

        assert_eq!(stored[META_KEY]["turnNumber"].as_u64(), Some(4));
        let loaded = Conversation::from_stored(Dialect::Bedrock, &stored);
        assert_eq!(loaded.history(), &history);
        assert_eq!(loaded.turn(), TurnContext::new(4));
    }

    #[test]
    fn array_history_round_trips_through_envelope() {
        let history = Value::from(json!([{ "role": "user", "content": "hi" }]));
        let conv = Conversation::with_history(Dialect::OpenAi, history.clone(), TurnContext::new(2));
        let stored = conv.to_stored();

        assert_eq!(stored[HISTORY_KEY], history);
        assert_eq!(stored[META_KEY]["turnNumber"].as_u64(), Some(2));
        assert_eq!(Conversation::from_stored(Dialect::OpenAi, &stored), conv);

        let bare = Conversation::from_stored(Dialect::OpenAi, &history);
        assert_eq!(bare.turn_number(), 0);
        assert_eq!(bare.history(), &history);
    }

    #[test]
    fn loaded_histories_take_the_dialect_shape() {
        let messages = json!([
            { "role": "user", "content": "first" },
            { "role": "assistant", "content": "reply" }
        ]);

        let claude = Conversation::from_stored(Dialect::Claude, &Value::from(messages.clone()));
        assert_eq!(claude.history(), &Value::from(json!({ "messages": messages.clone() })));

        let openai = Conversation::from_stored(
            Dialect::OpenAi,
            &Value::from(json!({ "messages": messages.clone(), "_llumiverse_meta": { "turnNumber": 3 } })),
        );
        assert_eq!(openai.history(), &Value::from(messages));
        assert_eq!(openai.turn_number(), 3);

        let gemini = Conversation::from_stored(
            Dialect::Gemini,
            &Value::from(json!({ "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }] })),
        );
        assert_eq!(gemini.history().as_array().map(Vec::len), Some(1));

        let single = Conversation::from_stored(
            Dialect::Gemini,
            &Value::from(json!({ "role": "user", "parts": [{ "text": "hi" }] })),
        );
        assert_eq!(single.history().as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn stored_form_boxes_bytes_and_request_history_restores_them() {
        let history = Value::object([(
            "messages",
            Value::from(vec![Value::object([
                ("role", Value::from("user")),
                (
                    "content",
                    Value::from(vec![Value::object([(
                        "image",
                        Value::object([
                            ("format", Value::from("png")),
                            ("source", Value::object([("bytes", Value::Bytes(vec![1, 2, 3]))])),
                        ]),
                    )])]),
                ),
            ])]),
        )]);
        let conv = Conversation::with_history(Dialect::Bedrock, history.clone(), TurnContext::new(1));

        let json = conv.to_json_string().unwrap();
        assert!(json.contains("\"_base64\":\"AQID\""));

        let loaded = Conversation::from_json_str(Dialect::Bedrock, &json).unwrap();
        assert!(!contains_raw_bytes(loaded.history()));
        assert_eq!(loaded.request_history(), history);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = Conversation::from_json_str(Dialect::Claude, "{not json").unwrap_err();
        assert!(matches!(err, ConversationError::JsonError(_)));
    }

    #[test]
    fn append_uses_dialect_merge() {
        let mut conv = Conversation::new(Dialect::Gemini);
        conv.append(&Value::from(json!({ "role": "user", "parts": [{ "text": "hi" }] })));
        conv.append(&Value::from(json!([{ "role": "model", "parts": [{ "text": "hello" }] }])));
        assert_eq!(conv.history().as_array().map(Vec::len), Some(2));

        let next = conv.next_turn();
        assert_eq!(next.turn_number(), 1);
    }
}
