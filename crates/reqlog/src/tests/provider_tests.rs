use std::sync::{Arc, Mutex};

use crate::{
    FieldObfuscator, LogError, LogLevel, LogParams, LogProvider, LogRecord, LogResult,
    MemorySink, ObfuscationRule, RedactionError, RequestContext, RequestContextStore, Sink,
};

use proptest::prelude::*;
use serde_json::json;

struct FailingSink;

impl Sink for FailingSink {
    fn write(&self, _record: &LogRecord) -> LogResult<()> {
        Err(LogError::sink("disk full"))
    }
}

struct PanickingSink;

impl Sink for PanickingSink {
    fn write(&self, _record: &LogRecord) -> LogResult<()> {
        panic!("transport gone")
    }
}

fn captured_fallback() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    (lines, move |line: &str| sink.lock().unwrap().push(line.to_string()))
}

#[test]
fn test_sensitive_metadata_is_redacted() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    logger.info(
        LogParams::new("user updated password")
            .with_context("AuthService")
            .field("password", "hunter2")
            .field("user", json!({"phoneNumber": "1234567890", "name": "A"})),
    );

    let record = sink.last().unwrap();
    assert_eq!(record.message, "user updated password");
    assert_eq!(record.context.as_deref(), Some("AuthService"));
    assert_eq!(record.metadata["password"], json!("***"));
    assert_eq!(record.metadata["user"]["phoneNumber"], json!("123*****90"));
    assert_eq!(record.metadata["user"]["name"], json!("A"));
}

#[test]
fn test_deeply_nested_secret_never_reaches_sink() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());
    let payload = (0..131).fold(json!({"password": "hunter2"}), |inner, _| json!({"n": inner}));

    logger.info(LogParams::new("m").field("payload", payload));

    let record = sink.last().unwrap();
    let serialized = serde_json::to_string(&record.metadata).unwrap();
    assert!(!serialized.contains("hunter2"));
    assert!(serialized.contains("\"***\""));
}

#[test]
fn test_message_and_context_are_never_obfuscated() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    logger.warn(json!({"message": "password", "context": "secret", "secret": "s"}));

    let record = sink.last().unwrap();
    assert_eq!(record.message, "password");
    assert_eq!(record.context.as_deref(), Some("secret"));
    assert_eq!(record.metadata["secret"], json!("***"));
    assert!(!record.metadata.contains_key("message"));
    assert!(!record.metadata.contains_key("context"));
}

#[test]
fn test_each_level_method() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    logger.debug("d");
    logger.info("i");
    logger.warn("w");
    logger.error("e");
    logger.log(LogLevel::Info, "direct");

    let levels: Vec<LogLevel> = sink.records().iter().map(|r| r.level).collect();
    assert_eq!(
        levels,
        vec![
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Info
        ]
    );
}

#[test]
fn test_exactly_one_write_per_call() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    for i in 0..10 {
        logger.info(LogParams::new("tick").field("i", i));
    }

    assert_eq!(sink.len(), 10);
    let order: Vec<i64> = sink
        .records()
        .iter()
        .map(|r| r.metadata["i"].as_i64().unwrap())
        .collect();
    assert_eq!(order, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_no_request_id_outside_scope() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    logger.info("background job");

    assert!(sink.last().unwrap().request_id.is_none());
}

#[tokio::test]
async fn test_request_id_from_active_context() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    RequestContextStore::run(RequestContext::with_request_id("req-7"), async {
        tokio::task::yield_now().await;
        logger.info("inside");
    })
    .await;

    assert_eq!(sink.last().unwrap().request_id.as_deref(), Some("req-7"));
}

#[test]
fn test_failing_sink_reports_to_fallback() {
    let (lines, fallback) = captured_fallback();
    let logger = LogProvider::new(FailingSink).with_fallback(fallback);

    logger.error(LogParams::new("charge failed").field("secret", "s3cr3t"));

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("charge failed"));
    assert!(lines[0].contains("disk full"));
    assert!(!lines[0].contains("s3cr3t"));
}

#[test]
fn test_panicking_sink_is_contained() {
    let (lines, fallback) = captured_fallback();
    let logger = LogProvider::new(PanickingSink).with_fallback(fallback);

    logger.info("still fine");

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("transport gone"));
}

#[test]
fn test_panicking_fallback_is_contained() {
    let logger = LogProvider::new(FailingSink).with_fallback(|_| panic!("fallback broken"));
    logger.info("nothing escapes");
}

#[test]
fn test_failing_pattern_redacts_and_still_writes() {
    let sink = MemorySink::new();
    let (lines, fallback) = captured_fallback();
    let obfuscator = FieldObfuscator::with_defaults()
        .with_rule(ObfuscationRule::new("email", |_| Err(RedactionError::new("bad"))))
        .with_rule(ObfuscationRule::new(
            "ssn",
            |_| -> Result<String, RedactionError> { panic!("pattern exploded") },
        ));
    let logger = LogProvider::new(sink.clone())
        .with_obfuscator(obfuscator)
        .with_fallback(fallback);

    logger.info(
        LogParams::new("signup")
            .field("email", "a@b.io")
            .field("ssn", "123-45-6789"),
    );

    let record = sink.last().unwrap();
    assert_eq!(record.metadata["email"], json!("***"));
    assert_eq!(record.metadata["ssn"], json!("***"));
    assert!(lines.lock().unwrap().is_empty());
}

#[test]
fn test_build_record_without_writing() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());

    let record = logger.build_record(
        LogLevel::Debug,
        LogParams::new("preview").field("refreshToken", "t"),
    );

    assert_eq!(record.metadata["refreshToken"], json!("***"));
    assert!(sink.is_empty());
}

#[test]
fn test_provider_clones_share_sink() {
    let sink = MemorySink::new();
    let logger = LogProvider::new(sink.clone());
    let other = logger.clone();

    logger.info("a");
    other.info("b");

    assert_eq!(sink.len(), 2);
}

proptest! {
    /// Property: Messages reach the sink verbatim, whatever they contain.
    #[test]
    fn prop_message_passes_through(message in ".{0,40}") {
        let sink = MemorySink::new();
        let logger = LogProvider::new(sink.clone());

        logger.info(LogParams::new(message.clone()).field("password", message.clone()));

        let record = sink.last().unwrap();
        prop_assert_eq!(record.message, message);
        prop_assert_eq!(&record.metadata["password"], &json!("***"));
    }

    /// Property: Non-sensitive fields reach the sink unchanged.
    #[test]
    fn prop_plain_fields_unchanged(name in "[a-z]{3,10}", age in 1i32..100) {
        let sink = MemorySink::new();
        let logger = LogProvider::new(sink.clone());

        logger.info(LogParams::new("m").field("name", &name).field("age", age));

        let record = sink.last().unwrap();
        prop_assert_eq!(&record.metadata["name"], &json!(name));
        prop_assert_eq!(&record.metadata["age"], &json!(age));
    }
}
