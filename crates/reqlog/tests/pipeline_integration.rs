//! End-to-end tests through the public API: interceptor, context, provider,
//! obfuscation and a JSON sink writing into a shared buffer.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqlog::prelude::*;
use reqlog::{FanoutSink, JsonSink, LogRecord};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn create_user(logger: LogProvider, body: Value) -> Result<u64, String> {
    logger.info(
        LogParams::from(body.clone())
            .with_context("UserService")
            .field("step", "validate"),
    );
    tokio::time::sleep(Duration::from_millis(1)).await;

    if body.get("name").is_none() {
        logger.error(LogParams::new("missing name").with_context("UserService"));
        return Err("name is required".to_string());
    }

    logger.info(LogParams::new("user created").with_context("UserService").field("userId", 1));
    Ok(1)
}

#[tokio::test]
async fn test_json_pipeline_redacts_and_correlates() {
    let buffer = SharedBuffer::default();
    let logger = LogProvider::new(JsonSink::new(buffer.clone()));
    let logging = RequestLogging::new(logger.clone(), LoggingConfig::new());

    let body = json!({
        "message": "signup received",
        "name": "Ada",
        "password": "correct horse",
        "profile": {"phoneNumber": "5551234567", "tags": ["a", {"secret": "x"}]}
    });
    let req = RequestInfo::new("POST", "/users").with_header("X-Request-Id", "trace-abc");

    let result = logging.handle(req, create_user(logger.clone(), body)).await;
    assert_eq!(result, Ok(1));

    let lines = buffer.lines();
    let messages: Vec<&str> = lines.iter().map(|l| l["message"].as_str().unwrap()).collect();
    assert_eq!(
        messages,
        ["request started", "signup received", "user created", "request completed"]
    );

    for line in &lines {
        assert_eq!(line["requestId"], json!("trace-abc"));
    }

    let signup = &lines[1];
    assert_eq!(signup["context"], json!("UserService"));
    assert_eq!(signup["metadata"]["password"], json!("***"));
    assert_eq!(signup["metadata"]["profile"]["phoneNumber"], json!("555*****67"));
    assert_eq!(signup["metadata"]["profile"]["tags"][1]["secret"], json!("***"));
    assert_eq!(signup["metadata"]["name"], json!("Ada"));

    let raw = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(!raw.contains("correct horse"));
    assert!(!raw.contains("5551234567"));
}

#[tokio::test]
async fn test_failed_request_through_fanout() {
    let buffer = SharedBuffer::default();
    let memory = MemorySink::new();
    let fanout = FanoutSink::new()
        .with_sink(JsonSink::new(buffer.clone()))
        .with_sink(memory.clone());
    let logger = LogProvider::new(fanout);
    let logging = RequestLogging::new(logger.clone(), LoggingConfig::new());

    let result = logging
        .handle(
            RequestInfo::new("POST", "/users"),
            create_user(logger.clone(), json!({"message": "signup received"})),
        )
        .await;

    assert_eq!(result, Err("name is required".to_string()));
    assert_eq!(buffer.lines().len(), memory.len());

    let records: Vec<LogRecord> = memory.records();
    let last = records.last().unwrap();
    assert_eq!(last.message, "request failed");
    assert_eq!(last.metadata["error"], json!("name is required"));

    let generated = records[0].request_id.clone().unwrap();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
    assert!(records.iter().all(|r| r.request_id.as_deref() == Some(generated.as_str())));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interleaved_requests_never_mix_ids() {
    let memory = MemorySink::new();
    let logger = LogProvider::new(memory.clone());
    let logging = RequestLogging::new(
        logger.clone(),
        LoggingConfig::new().with_ignore(LoggingIgnoreConfig::new().ignore_route("/health")),
    );

    let a = logging.handle(
        RequestInfo::new("POST", "/users").with_header("x-request-id", "A"),
        create_user(logger.clone(), json!({"message": "a", "name": "A"})),
    );
    let b = logging.handle(
        RequestInfo::new("POST", "/users").with_header("x-request-id", "B"),
        create_user(logger.clone(), json!({"message": "b", "name": "B"})),
    );
    let health = logging.handle(RequestInfo::new("GET", "/health"), async {
        Ok::<_, String>(0)
    });

    let (a, b, health) = tokio::join!(a, b, health);
    assert_eq!((a, b, health), (Ok(1), Ok(1), Ok(0)));

    for record in memory.records() {
        match record.message.as_str() {
            "a" => assert_eq!(record.request_id.as_deref(), Some("A")),
            "b" => assert_eq!(record.request_id.as_deref(), Some("B")),
            _ => assert!(record.request_id.is_some()),
        }
        assert_ne!(record.metadata.get("path"), Some(&json!("/health")));
    }
    assert_eq!(memory.len(), 8);
}
