//! File logging through the telemetry subscriber
use serde_json::json;
use siumai_conversation::telemetry::{OutputFormat, SubscriberConfig, init_default, init_subscriber};
use siumai_conversation::{Conversation, Dialect, TurnPipeline, Value};

#[test]
fn repair_warnings_reach_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("conversation.log");

    let config = SubscriberConfig::builder()
        .log_level(tracing::Level::DEBUG)
        .output_format(OutputFormat::Json)
        .log_file(&log_file)
        .build();
    let guard = init_subscriber(config).unwrap();
    assert!(guard.is_some());

    let history = Value::from(json!({ "messages": [
        { "role": "assistant", "content": [
            { "toolUse": { "toolUseId": "abc", "name": "search", "input": {} } }
        ] }
    ] }));
    let conversation = Conversation::with_history(Dialect::Bedrock, history, Default::default());
    let prompt = Value::from(json!({ "role": "user", "content": [{ "text": "next" }] }));
    let reply = Value::from(json!({ "role": "assistant", "content": [{ "text": "ok" }] }));
    TurnPipeline::default().run_turn(conversation, &prompt, &reply, true);

    drop(guard);
    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("Synthesized tool results for interrupted tool calls"));
    assert!(contents.contains("Completed conversation turn"));

    // a second installation leaves the first subscriber in place
    assert!(init_default().unwrap().is_none());
}
