use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::{json, Value};
use time::macros::datetime;

use chatlog::ingest::StreamFilter;

struct CaptureLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

fn conversation(id: &str) -> Value {
    json!({
        "uuid": id,
        "created_at": "2024-06-01T10:00:00Z",
        "chat_messages": [{"sender": "human", "text": "hi"}],
    })
}

// Single test: the capture logger is process-global.
#[test]
fn progress_cadence_and_extraction_warnings() {
    log::set_logger(&LOGGER).expect("install logger");
    log::set_max_level(LevelFilter::Trace);

    let mut items: Vec<Value> = (0..250).map(|i| conversation(&format!("c{i}"))).collect();
    items[120]["uuid"] = json!("broken-120");
    items[120]["chat_messages"] = json!("not a list");
    let input = serde_json::to_vec(&Value::Array(items)).expect("encode");

    let outcome = StreamFilter::new(datetime!(2024-05-01 00:00:00))
        .with_progress_interval(100)
        .filter_reader(input.as_slice());
    assert_eq!(outcome.stats.examined, 250);
    assert_eq!(outcome.stats.accepted, 249);
    assert_eq!(outcome.stats.failed, 1);

    let lines = LOGGER.lines.lock().expect("lines").clone();
    let progress: Vec<&str> = lines
        .iter()
        .filter(|(_, line)| line.starts_with("Processed "))
        .map(|(_, line)| line.as_str())
        .collect();
    assert_eq!(
        progress,
        vec![
            "Processed 0 conversations...",
            "Processed 100 conversations...",
            "Processed 200 conversations...",
        ]
    );

    let warnings: Vec<&str> = lines
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, line)| line.as_str())
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Error processing conversation broken-120:"));
    assert!(warnings[0].contains("chat_messages is not an array"));
}
