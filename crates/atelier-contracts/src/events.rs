use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type EventPayload = Map<String, Value>;

/// Structured session log.
///
/// - default fields are `type`, `session_id`, `ts`
/// - caller payload is merged last and can override defaults
/// - file sinks get one compact JSON object per line
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    sink: EventSink,
    session_id: String,
}

#[derive(Debug)]
enum EventSink {
    File { path: PathBuf, lock: Mutex<()> },
    Memory(Mutex<Vec<Value>>),
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self::with_sink(
            EventSink::File {
                path: path.into(),
                lock: Mutex::new(()),
            },
            session_id.into(),
        )
    }

    /// Keeps events in memory; used by hosts without a writable log location.
    pub fn in_memory(session_id: impl Into<String>) -> Self {
        Self::with_sink(EventSink::Memory(Mutex::new(Vec::new())), session_id.into())
    }

    pub fn new_session_id() -> String {
        format!("session-{}", Uuid::new_v4().simple())
    }

    fn with_sink(sink: EventSink, session_id: String) -> Self {
        Self {
            inner: Arc::new(EventWriterInner { sink, session_id }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.inner.sink {
            EventSink::File { path, .. } => Some(path.as_path()),
            EventSink::Memory(_) => None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in payload {
            event.insert(key, value);
        }
        let event = Value::Object(event);

        match &self.inner.sink {
            EventSink::File { path, lock } => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let line = serde_json::to_string(&event)?;
                let _guard = lock
                    .lock()
                    .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
            }
            EventSink::Memory(rows) => {
                rows.lock()
                    .map_err(|_| anyhow::anyhow!("event buffer lock poisoned"))?
                    .push(event.clone());
            }
        }

        Ok(event)
    }

    /// Events recorded so far. File sinks are read back from disk.
    pub fn recorded(&self) -> anyhow::Result<Vec<Value>> {
        match &self.inner.sink {
            EventSink::File { path, .. } => {
                if !path.exists() {
                    return Ok(Vec::new());
                }
                let raw = std::fs::read_to_string(path)?;
                Ok(raw
                    .lines()
                    .filter_map(|line| serde_json::from_str::<Value>(line).ok())
                    .collect())
            }
            EventSink::Memory(rows) => Ok(rows
                .lock()
                .map_err(|_| anyhow::anyhow!("event buffer lock poisoned"))?
                .clone()),
        }
    }

    pub fn recorded_types(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .recorded()?
            .iter()
            .filter_map(|row| row.get("type").and_then(Value::as_str).map(str::to_string))
            .collect())
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;

    use super::*;

    #[test]
    fn emit_writes_compact_jsonl_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        let mut payload = EventPayload::new();
        payload.insert("mode".to_string(), Value::String("HOME_RENOVATION".to_string()));
        let emitted = writer.emit("mode_switched", payload)?;

        let content = fs::read_to_string(&path)?;
        let line = content.lines().next().unwrap_or("");
        let parsed: Value = serde_json::from_str(line)?;

        assert_eq!(parsed, emitted);
        assert_eq!(parsed["type"], Value::String("mode_switched".to_string()));
        assert_eq!(parsed["session_id"], Value::String("session-123".to_string()));
        assert_eq!(parsed["mode"], Value::String("HOME_RENOVATION".to_string()));

        let ts = parsed["ts"].as_str().unwrap_or("");
        DateTime::parse_from_rfc3339(ts)?;
        Ok(())
    }

    #[test]
    fn payload_can_override_default_keys() -> anyhow::Result<()> {
        let writer = EventWriter::in_memory("session-123");

        let mut payload = EventPayload::new();
        payload.insert("type".to_string(), Value::String("override".to_string()));
        let emitted = writer.emit("batch_started", payload)?;

        assert_eq!(emitted["type"], Value::String("override".to_string()));
        assert_eq!(writer.recorded_types()?, vec!["override"]);
        Ok(())
    }

    #[test]
    fn file_sink_appends_and_reads_back_in_order() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "session-123");

        writer.emit("one", EventPayload::new())?;
        writer.emit("two", EventPayload::new())?;

        assert_eq!(writer.recorded_types()?, vec!["one", "two"]);
        assert!(writer.path().is_some());
        Ok(())
    }

    #[test]
    fn generated_session_ids_are_distinct() {
        let first = EventWriter::new_session_id();
        let second = EventWriter::new_session_id();
        assert!(first.starts_with("session-"));
        assert_ne!(first, second);
    }
}
