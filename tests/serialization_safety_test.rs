//! Serialization safety of stripped and stored conversations
use proptest::prelude::*;
use serde_json::json;
use siumai_conversation::classify::DOCUMENT_PLACEHOLDER;
use siumai_conversation::codec::contains_raw_bytes;
use siumai_conversation::meta::{META_KEY, TurnContext, set_meta};
use siumai_conversation::prelude::*;

/// An object whose keys are all numeric strings, more than 10 of them: what
/// a byte buffer turns into when a JSON encoder walks it as a map.
fn has_numeric_key_object(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(map) => {
            (map.len() > 10 && map.keys().all(|k| k.parse::<u64>().is_ok()))
                || map.values().any(has_numeric_key_object)
        }
        serde_json::Value::Array(items) => items.iter().any(has_numeric_key_object),
        _ => false,
    }
}

fn bedrock_block() -> impl Strategy<Value = Value> {
    let bytes = prop::collection::vec(any::<u8>(), 11..64);
    prop_oneof![
        "[a-z ]{0,16}".prop_map(|t| Value::object([("text", Value::from(t))])),
        bytes.clone().prop_map(|b| Value::object([(
            "image",
            Value::object([
                ("format", Value::from("png")),
                ("source", Value::object([("bytes", Value::Bytes(b))])),
            ]),
        )])),
        bytes.clone().prop_map(|b| Value::object([(
            "document",
            Value::object([
                ("format", Value::from("pdf")),
                ("name", Value::from("doc")),
                ("source", Value::object([("bytes", Value::Bytes(b))])),
            ]),
        )])),
        bytes.prop_map(|b| Value::object([("blob", Value::Bytes(b))])),
    ]
}

fn bedrock_conversation() -> impl Strategy<Value = Value> {
    prop::collection::vec(prop::collection::vec(bedrock_block(), 1..4), 0..5).prop_map(|messages| {
        Value::object([(
            "messages",
            Value::from(
                messages
                    .into_iter()
                    .map(|content| {
                        Value::object([
                            ("role", Value::from("user")),
                            ("content", Value::from(content)),
                        ])
                    })
                    .collect::<Vec<_>>(),
            ),
        )])
    })
}

proptest! {
    #[test]
    fn stripped_binary_never_serializes_as_numeric_keys(
        tree in bedrock_conversation(),
        keep in 0u64..4,
        turn in 0u64..4
    ) {
        let policy = RetentionPolicy::after_turns(keep).at_turn(turn);
        let stripped = strip_binary(&tree, &policy);

        prop_assert!(!contains_raw_bytes(&stripped));
        let encoded = serde_json::to_string(&stripped).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        prop_assert!(!has_numeric_key_object(&parsed));
    }

    #[test]
    fn forced_stripping_is_idempotent(tree in bedrock_conversation()) {
        let once = strip_binary(&tree, &RetentionPolicy::forced());
        let twice = strip_binary(&once, &RetentionPolicy::forced());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn metadata_survives_every_pass(tree in bedrock_conversation(), turn in 0u64..5) {
        let tree = set_meta(&tree, TurnContext::new(turn));
        let meta = tree.get(META_KEY).cloned();

        prop_assert_eq!(strip_binary(&tree, &RetentionPolicy::forced()).get(META_KEY).cloned(), meta.clone());
        prop_assert_eq!(strip_base64_images(&tree, &RetentionPolicy::forced()).get(META_KEY).cloned(), meta.clone());
        prop_assert_eq!(truncate_text(&tree, &TruncateOptions::new(Some(1))).get(META_KEY).cloned(), meta.clone());
        prop_assert_eq!(strip_heartbeats(&tree, &RetentionPolicy::forced()).get(META_KEY).cloned(), meta);
    }
}

#[test]
fn forced_document_becomes_document_placeholder() {
    let tree = Value::from(vec![Value::object([(
        "document",
        Value::object([
            ("format", Value::from("pdf")),
            ("source", Value::object([("bytes", Value::Bytes(vec![1, 2, 3, 4]))])),
        ]),
    )])]);
    let out = strip_binary(&tree, &RetentionPolicy::forced());
    assert_eq!(out, Value::from(json!([{ "text": DOCUMENT_PLACEHOLDER }])));
}

#[test]
fn generic_serializer_boxes_live_bytes() {
    let tree = Value::object([("payload", Value::Bytes((0u8..32).collect()))]);
    let encoded = serde_json::to_value(&tree).unwrap();
    assert!(!has_numeric_key_object(&encoded));
    assert!(encoded["payload"]["_base64"].is_string());
}

#[test]
fn stored_conversations_are_plain_json() {
    let history = Value::object([(
        "messages",
        Value::from(vec![Value::object([
            ("role", Value::from("user")),
            (
                "content",
                Value::from(vec![Value::object([(
                    "video",
                    Value::object([
                        ("format", Value::from("mp4")),
                        ("source", Value::object([("bytes", Value::Bytes(vec![0; 128]))])),
                    ]),
                )])]),
            ),
        ])]),
    )]);
    let conversation = Conversation::with_history(Dialect::Bedrock, history, TurnContext::new(7));

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), conversation.to_json_string().unwrap()).unwrap();
    let text = std::fs::read_to_string(file.path()).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(!has_numeric_key_object(&parsed));
    assert_eq!(parsed[META_KEY]["turnNumber"], json!(7));

    let loaded = Conversation::from_json_str(Dialect::Bedrock, &text).unwrap();
    assert_eq!(loaded.request_history(), conversation.request_history());
}
