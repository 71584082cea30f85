//! Server-Sent Events (SSE) parser
//!
//! Works on raw bytes so that multi-byte UTF-8 sequences split across network
//! chunks are reassembled before decoding.

use crate::error::{ClientError, Result};

/// SSE event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type from an `event:` field
    pub event_type: Option<String>,

    /// Event data, multiple `data:` lines joined by `\n`
    pub data: String,
}

impl SseEvent {
    fn is_empty(&self) -> bool {
        self.event_type.is_none() && self.data.is_empty()
    }
}

/// Incremental SSE parser
///
/// Feed it bytes as they arrive; it returns each event once the blank line
/// that terminates it has been seen.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    pending: SseEvent,
    has_data: bool,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a chunk of bytes, returning the events it completes
    ///
    /// # Errors
    ///
    /// Returns an error if a complete line is not valid UTF-8
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = decode_line(&raw[..raw.len() - 1])?;
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flush whatever is buffered once the byte stream has ended
    ///
    /// # Errors
    ///
    /// Returns an error if the trailing bytes are not valid UTF-8
    pub fn finish(&mut self) -> Result<Option<SseEvent>> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = decode_line(&raw)?;
            if let Some(event) = self.process_line(line) {
                return Ok(Some(event));
            }
        }
        Ok(self.take_pending())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take_pending();
        }

        // comment / keepalive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.pending.event_type = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
                self.has_data = true;
            }
            _ => {}
        }
        None
    }

    fn take_pending(&mut self) -> Option<SseEvent> {
        self.has_data = false;
        let event = std::mem::take(&mut self.pending);
        (!event.is_empty()).then_some(event)
    }
}

fn decode_line(raw: &[u8]) -> Result<&str> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|e| ClientError::Stream(format!("Invalid UTF-8 in stream: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: {\"text\":\"hello\"}\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, None);
        assert_eq!(events[0].data, r#"{"text":"hello"}"#);
    }

    #[test]
    fn test_parse_multi_line_data_and_crlf() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: test\r\ndata: line1\r\ndata: line2\r\n\r\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("test"));
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: par").unwrap().is_empty());
        assert!(parser.feed(b"tial\n").unwrap().is_empty());

        let events = parser.feed(b"\ndata: next\n\n").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "partial");
        assert_eq!(events[1].data, "next");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let bytes = "data: héllo\n\n".as_bytes();
        // split inside the two-byte 'é'
        let split = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut parser = SseParser::new();
        assert!(parser.feed(&bytes[..split]).unwrap().is_empty());
        let events = parser.feed(&bytes[split..]).unwrap();
        assert_eq!(events[0].data, "héllo");
    }

    #[test]
    fn test_invalid_utf8() {
        let mut parser = SseParser::new();
        let err = parser.feed(b"data: \xff\xfe\n").unwrap_err();
        assert!(matches!(err, ClientError::Stream(_)));
    }

    #[test]
    fn test_ignore_comments() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keepalive\n\ndata: test\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "test");
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: test").unwrap().is_empty());

        let event = parser.finish().unwrap();
        assert_eq!(event.map(|e| e.data), Some("test".to_string()));
        assert_eq!(parser.finish().unwrap(), None);
    }
}
