//! Event log line parser.
//!
//! Parses single-line JSON events back into [`EventRecord`]s. Tolerant by
//! design: unknown fields are ignored, missing optional fields default, and
//! when scanning a whole log body, corrupt or empty lines are skipped with a
//! warning rather than aborting the load. Partial trailing lines (an append
//! interrupted mid-write) fail to parse and are skipped the same way.

use super::EventRecord;
use tracing::warn;

/// Errors from parsing a single log line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line is not valid JSON for an event record.
    #[error("invalid event JSON: {0}")]
    Json(String),

    /// A required identity field was empty after trimming.
    #[error("event is missing a usable '{0}' field")]
    EmptyField(&'static str),
}

/// Result of replaying a log body: the well-formed events in file order,
/// plus the number of lines that had to be skipped.
#[derive(Debug, Default)]
pub struct ReplayedEvents {
    /// Parsed events in log order (which is ingestion order).
    pub events: Vec<EventRecord>,
    /// Count of corrupt lines skipped during the scan.
    pub skipped: usize,
}

/// Parse one log line into an [`EventRecord`].
///
/// # Errors
///
/// Returns [`ParseError::Json`] for malformed JSON and
/// [`ParseError::EmptyField`] when `eventId`, `serviceName`, or `eventType`
/// is absent or blank.
pub fn parse_line(line: &str) -> Result<EventRecord, ParseError> {
    let record: EventRecord =
        serde_json::from_str(line.trim()).map_err(|e| ParseError::Json(e.to_string()))?;

    if record.event_id.trim().is_empty() {
        return Err(ParseError::EmptyField("eventId"));
    }
    if record.service_name.trim().is_empty() {
        return Err(ParseError::EmptyField("serviceName"));
    }
    if record.event_type.trim().is_empty() {
        return Err(ParseError::EmptyField("eventType"));
    }

    Ok(record)
}

/// Parse a whole log body, skipping blank and corrupt lines with a warning.
#[must_use]
pub fn parse_lines(content: &str) -> ReplayedEvents {
    let mut replay = ReplayedEvents::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => replay.events.push(record),
            Err(err) => {
                replay.skipped += 1;
                warn!(line = idx + 1, %err, "skipping unreadable event log line");
            }
        }
    }

    replay
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::sample_record;
    use crate::event::writer::write_line;

    #[test]
    fn parse_roundtrips_written_line() {
        let record = sample_record();
        let line = write_line(&record).expect("write");
        let back = parse_line(&line).expect("parse");
        assert_eq!(record, back);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_line("{not json").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn parse_rejects_blank_event_id() {
        let err = parse_line(r#"{"eventId":"  ","serviceName":"S","eventType":"T"}"#).unwrap_err();
        assert_eq!(err, ParseError::EmptyField("eventId"));
    }

    #[test]
    fn parse_rejects_missing_service_name() {
        let err = parse_line(r#"{"eventId":"e","serviceName":"","eventType":"T"}"#).unwrap_err();
        assert_eq!(err, ParseError::EmptyField("serviceName"));
    }

    #[test]
    fn parse_lines_keeps_order_and_skips_garbage() {
        let a = sample_record();
        let mut b = sample_record();
        b.event_id = "another-id".into();

        let body = format!(
            "{}not json at all\n\n{}",
            write_line(&a).expect("write a"),
            write_line(&b).expect("write b"),
        );

        let replay = parse_lines(&body);
        assert_eq!(replay.events.len(), 2);
        assert_eq!(replay.skipped, 1);
        assert_eq!(replay.events[0].event_id, a.event_id);
        assert_eq!(replay.events[1].event_id, b.event_id);
    }

    #[test]
    fn parse_lines_skips_partial_trailing_line() {
        let a = sample_record();
        let mut body = write_line(&a).expect("write");
        // Simulate a torn append: half of a JSON object with no newline.
        body.push_str("{\"eventId\":\"torn\",\"service");

        let replay = parse_lines(&body);
        assert_eq!(replay.events.len(), 1);
        assert_eq!(replay.skipped, 1);
    }

    #[test]
    fn parse_lines_of_empty_body() {
        let replay = parse_lines("");
        assert!(replay.events.is_empty());
        assert_eq!(replay.skipped, 0);
    }
}
