//! In-memory capture of the JSON log stream of one scenario.
//!
//! Each scenario gets a fresh [`LogCapture`]. The subscriber writes newline
//! delimited JSON into it, and the scenario reads the stream back as
//! [`LoggedEvent`]s, most usefully the two dumps the logging filters write for
//! every call.

use crate::utils::{
    filters::{REQUEST_SENT, RESPONSE_RECEIVED},
    profiles::{CapturedRequest, Exchange},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr};
use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// The log events a scenario emitted, decoded lazily.
#[derive(Debug, Default)]
pub struct LogCapture {
    /// Bytes written by the subscriber that have not been decoded yet. Only
    /// complete lines are taken out, so a partial write waits for its end.
    sink: Arc<Mutex<Vec<u8>>>,
    /// Decoded events, in emission order.
    events: Vec<LoggedEvent>,
    /// Lines that were not a JSON event.
    rejected: Vec<String>,
}

impl LogCapture {
    /// A writer for the subscriber that feeds this capture.
    pub fn writer(&self) -> CaptureWriter {
        CaptureWriter {
            sink: Arc::clone(&self.sink),
        }
    }

    /// Every event captured so far.
    pub fn events(&mut self) -> &[LoggedEvent] {
        self.drain();
        &self.events
    }

    /// Lines that could not be decoded as an event. Normally empty.
    pub fn rejected_lines(&mut self) -> &[String] {
        self.drain();
        &self.rejected
    }

    /// Whether any captured event matches `predicate`.
    #[must_use = "LogCapture::has does not assert anything by itself"]
    pub fn has<F>(&mut self, predicate: F) -> bool
    where
        F: FnMut(&LoggedEvent) -> bool,
    {
        self.events().iter().any(predicate)
    }

    /// The "request sent" dump for `request`.
    pub fn request_sent(&mut self, request: &CapturedRequest) -> Option<&LoggedEvent> {
        let method = request.method.as_str();
        self.events().iter().find(|event| {
            event.message() == Some(REQUEST_SENT)
                && event.str_field("url") == Some(request.url.as_str())
                && event.str_field("method") == Some(method)
        })
    }

    /// The "response received" dump for `exchange`.
    pub fn response_received(&mut self, exchange: &Exchange) -> Option<&LoggedEvent> {
        let status = exchange.response.status.as_u16();
        self.events().iter().find(|event| {
            event.message() == Some(RESPONSE_RECEIVED)
                && event.str_field("url") == Some(exchange.request.url.as_str())
                && event.field_eq("status", status)
        })
    }

    /// Move complete lines out of the sink and decode them.
    fn drain(&mut self) {
        let complete: Vec<u8> = {
            let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            match sink.iter().rposition(|&byte| byte == b'\n') {
                Some(end) => sink.drain(..=end).collect(),
                None => return,
            }
        };

        for line in String::from_utf8_lossy(&complete).lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LoggedEvent>(line) {
                Ok(event) => self.events.push(event),
                Err(_) => self.rejected.push(line.to_string()),
            }
        }
    }
}

/// The subscriber's handle on a [`LogCapture`].
#[derive(Clone, Debug)]
pub struct CaptureWriter {
    /// Shared with the owning capture.
    sink: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// One event as written by `tracing_subscriber`'s JSON formatter.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LoggedEvent {
    /// The level the event was emitted at.
    #[serde_as(as = "DisplayFromStr")]
    pub level: Level,
    /// The module that emitted it.
    pub target: String,
    /// Key-value fields, including `message`.
    pub fields: Map<String, Value>,
    /// Fields of the innermost span the event was emitted in.
    #[serde(default)]
    pub span: Map<String, Value>,
}

impl LoggedEvent {
    /// The event's message.
    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    /// The field `name`, if it is a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Whether the field `name` equals `expected`.
    pub fn field_eq(&self, name: &str, expected: impl Into<Value>) -> bool {
        self.fields.get(name) == Some(&expected.into())
    }

    /// The scenario this event was emitted under.
    pub fn scenario(&self) -> Option<&str> {
        self.span.get("scenario").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::LogCapture;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tracing::Level;

    const SENT: &str = r#"{"timestamp":"t","level":"INFO","target":"petclinic_api_tests::utils::filters","fields":{"message":"request sent","method":"GET","url":"http://svc/api/vet/vets"},"span":{"scenario":"vets","name":"scenario"}}"#;

    #[test]
    fn decodes_complete_lines_only() {
        let mut capture = LogCapture::default();
        let mut writer = capture.writer();

        let (head, tail) = SENT.split_at(40);
        writer.write_all(head.as_bytes()).unwrap();
        assert!(capture.events().is_empty());

        writer.write_all(tail.as_bytes()).unwrap();
        writer.write_all(b"\n").unwrap();
        let events = capture.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message(), Some("request sent"));
        assert_eq!(events[0].scenario(), Some("vets"));
    }

    #[test]
    fn undecodable_lines_are_set_aside() {
        let mut capture = LogCapture::default();
        let mut writer = capture.writer();
        writer.write_all(b"not json\n\n").unwrap();
        writer.write_all(SENT.as_bytes()).unwrap();
        writer.write_all(b"\n\xff\xfe\n").unwrap();

        assert_eq!(capture.events().len(), 1);
        assert_eq!(capture.rejected_lines().len(), 2);
        assert_eq!(capture.rejected_lines()[0], "not json");
    }

    #[test]
    fn fields_compare_by_json_value() {
        let mut capture = LogCapture::default();
        capture
            .writer()
            .write_all(
                br#"{"level":"WARN","target":"t","fields":{"message":"response received","status":404}}
"#,
            )
            .unwrap();

        assert!(capture.has(|event| event.field_eq("status", 404)));
        assert!(!capture.has(|event| event.field_eq("status", "404")));
        assert!(capture.has(|event| event.scenario().is_none()));
    }
}
