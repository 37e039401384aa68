#![cfg(feature = "tracing-format")]

use json_template_layout::config::LayoutConfig;
use json_template_layout::format::TemplateEventFormat;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;

const TEMPLATE: &str = r#"{
  "level": "${json:level}",
  "logger": "${json:logger:name}",
  "message": "${json:message}",
  "ndc": "${json:ndc}",
  "mdc": "${json:mdc}",
  "error": {
    "class": "${json:exception:className}",
    "message": "${json:exception:message}",
    "rootCause": "${json:exceptionRootCause:className}"
  }
}"#;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("disk full")]
struct DiskFull;

#[derive(thiserror::Error, Debug)]
enum StoreError {
    #[error("write rejected")]
    Write(#[source] DiskFull),
}

fn capture<F: FnOnce()>(f: F) -> Vec<Value> {
    let config = LayoutConfig { event_template: Some(TEMPLATE.to_string()), ..LayoutConfig::default() };
    let layout = Arc::new(config.build_layout().unwrap());
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .event_format(TemplateEventFormat::new(layout))
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.lines()
}

#[test]
fn test_event_fields_become_mdc() {
    let lines = capture(|| {
        tracing::info!(user_id = 42, active = true, region = "eu-west", "user signed in");
    });
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["logger"], "tracing_format");
    assert_eq!(line["message"], "user signed in");
    assert_eq!(line["mdc"], json!({"active": true, "region": "eu-west", "user_id": 42}));
    assert_eq!(line["error"], json!({}));
    assert!(line.get("ndc").is_none());
}

#[test]
fn test_span_names_become_ndc() {
    let lines = capture(|| {
        let request = tracing::info_span!("request");
        let _request = request.enter();
        let query = tracing::debug_span!("query");
        let _query = query.enter();
        tracing::warn!("slow query");
    });
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["ndc"], json!(["request", "query"]));
}

#[test]
fn test_error_field_becomes_exception() {
    let lines = capture(|| {
        let err = StoreError::Write(DiskFull);
        tracing::error!(error = &err as &(dyn std::error::Error + 'static), "flush failed");
    });
    let line = &lines[0];
    assert_eq!(line["message"], "flush failed");
    assert_eq!(line["error"]["class"], "Write");
    assert_eq!(line["error"]["message"], "write rejected");
    assert_eq!(line["error"]["rootCause"], "DiskFull");
    assert!(line.get("mdc").is_none());
}

#[test]
fn test_one_line_per_event() {
    let lines = capture(|| {
        for i in 0..5 {
            tracing::info!(attempt = i, "retrying");
        }
    });
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[4]["mdc"]["attempt"], 4);
}
