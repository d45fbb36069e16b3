//! Turn metadata.
//!
//! The turn counter travels with the conversation as an explicit
//! [`TurnContext`]. It is only written into the tree at the storage
//! boundary, under [`META_KEY`] at the root of object-shaped histories or
//! inside a `{"history": [...], "_llumiverse_meta": {...}}` envelope for
//! array-shaped ones.

use serde::{Deserialize, Serialize};

use crate::value::{Map, Value};

/// Reserved root key carrying the turn metadata in stored conversations.
pub const META_KEY: &str = "_llumiverse_meta";

/// Envelope key holding array-shaped histories in stored form.
pub const HISTORY_KEY: &str = "history";

/// Turn counter of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub turn_number: u64,
}

impl TurnContext {
    pub fn new(turn_number: u64) -> Self {
        Self { turn_number }
    }

    /// The turn after this one. Never wraps.
    pub fn next(self) -> Self {
        Self {
            turn_number: self.turn_number.saturating_add(1),
        }
    }

    pub fn to_value(self) -> Value {
        Value::object([("turnNumber", Value::from(self.turn_number))])
    }

    /// Parse `{"turnNumber": N}`; `None` when the shape does not match.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.get("turnNumber").and_then(Value::as_u64).map(Self::new)
    }
}

/// Turn metadata stored at the root of `conversation`.
///
/// Missing, null or malformed metadata reads as turn 0.
pub fn get_meta(conversation: &Value) -> TurnContext {
    conversation
        .get(META_KEY)
        .and_then(TurnContext::from_value)
        .unwrap_or_default()
}

/// Copy of `conversation` with `meta` attached at the root.
///
/// Non-object conversations are returned unchanged.
pub fn set_meta(conversation: &Value, meta: TurnContext) -> Value {
    match conversation {
        Value::Object(map) => {
            let mut map = map.clone();
            map.insert(META_KEY.to_string(), meta.to_value());
            Value::Object(map)
        }
        other => other.clone(),
    }
}

/// Copy of `conversation` with its turn counter advanced by one.
pub fn increment_turn(conversation: &Value) -> Value {
    set_meta(conversation, get_meta(conversation).next())
}

/// Stored envelope for a history that has no root object of its own.
pub fn wrap_history(history: Value, meta: TurnContext) -> Value {
    let mut map = Map::new();
    map.insert(HISTORY_KEY.to_string(), history);
    map.insert(META_KEY.to_string(), meta.to_value());
    Value::Object(map)
}

/// Split a stored conversation into its working history and turn context.
///
/// Accepts the array envelope, an object carrying [`META_KEY`], a bare
/// array (turn 0) or `Null`.
pub fn unwrap_history(stored: &Value) -> (Value, TurnContext) {
    let meta = get_meta(stored);
    match stored {
        Value::Object(map) if is_history_envelope(map) => {
            let history = map.get(HISTORY_KEY).cloned().unwrap_or_default();
            (history, meta)
        }
        Value::Object(map) => {
            let mut map = map.clone();
            map.remove(META_KEY);
            (Value::Object(map), meta)
        }
        other => (other.clone(), meta),
    }
}

fn is_history_envelope(map: &Map) -> bool {
    map.get(HISTORY_KEY).is_some_and(Value::is_array)
        && map.keys().all(|k| k == HISTORY_KEY || k == META_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_meta_reads_as_turn_zero() {
        assert_eq!(get_meta(&Value::Null), TurnContext::new(0));
        assert_eq!(get_meta(&Value::from(json!([1, 2]))), TurnContext::new(0));
        assert_eq!(get_meta(&Value::from(json!({ "messages": [] }))), TurnContext::new(0));
        assert_eq!(
            get_meta(&Value::from(json!({ META_KEY: { "turnNumber": "3" } }))),
            TurnContext::new(0)
        );
    }

    #[test]
    fn set_meta_is_non_destructive() {
        let original = Value::from(json!({ "messages": [] }));
        let updated = set_meta(&original, TurnContext::new(2));

        assert!(original.get(META_KEY).is_none());
        assert_eq!(get_meta(&updated), TurnContext::new(2));
        assert_eq!(updated["messages"], original["messages"]);
    }

    #[test]
    fn set_meta_ignores_non_objects() {
        let arr = Value::from(json!([{ "role": "user" }]));
        assert_eq!(set_meta(&arr, TurnContext::new(5)), arr);
        assert_eq!(set_meta(&Value::Null, TurnContext::new(5)), Value::Null);
    }

    #[test]
    fn increment_turn_adds_exactly_one() {
        let conv = Value::from(json!({ "messages": [] }));
        let one = increment_turn(&conv);
        let two = increment_turn(&one);
        assert_eq!(get_meta(&one).turn_number, 1);
        assert_eq!(get_meta(&two).turn_number, 2);
    }

    #[test]
    fn envelope_round_trips() {
        let history = Value::from(json!([{ "role": "user", "parts": [{ "text": "hi" }] }]));
        let stored = wrap_history(history.clone(), TurnContext::new(4));
        assert_eq!(
            serde_json::to_value(&stored).unwrap(),
            json!({
                "history": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "_llumiverse_meta": { "turnNumber": 4 }
            })
        );
        assert_eq!(unwrap_history(&stored), (history, TurnContext::new(4)));
    }

    #[test]
    fn unwrap_strips_meta_from_object_histories() {
        let stored = Value::from(json!({
            "messages": [],
            "history": "not an envelope",
            META_KEY: { "turnNumber": 7 }
        }));
        let (history, meta) = unwrap_history(&stored);
        assert_eq!(meta.turn_number, 7);
        assert!(history.get(META_KEY).is_none());
        assert_eq!(history["history"].as_str(), Some("not an envelope"));
    }
}
