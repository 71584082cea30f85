//! Streaming support for chat responses
//!
//! Gemini's `streamGenerateContent?alt=sse` endpoint answers with Server-Sent
//! Events whose `data` fields each hold one JSON chunk.

pub mod sse_parser;

pub use sse_parser::{SseEvent, SseParser};

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::error::{ClientError, Result};

/// Turn an HTTP body stream into SSE events
///
/// Events are yielded as soon as they are complete. A transport or decoding
/// error is yielded once and ends the stream.
pub fn sse_events(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<SseEvent>> + Send + 'static {
    async_stream::stream! {
        let mut parser = SseParser::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            let parsed = chunk.map_err(ClientError::from).and_then(|bytes| parser.feed(&bytes));
            match parsed {
                Ok(events) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        match parser.finish() {
            Ok(Some(event)) => yield Ok(event),
            Ok(None) => {}
            Err(e) => yield Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_events_from_byte_chunks() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: one\n\nda")),
            Ok(Bytes::from_static(b"ta: two\n\n")),
            Ok(Bytes::from_static(b"data: three")),
        ];

        let events: Vec<_> = sse_events(stream::iter(chunks))
            .map(|e| e.unwrap().data)
            .collect()
            .await;

        assert_eq!(events, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_decode_error_ends_stream() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: one\n\n")),
            Ok(Bytes::from_static(b"data: \xff\n\n")),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];

        let results: Vec<_> = sse_events(stream::iter(chunks)).collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().data, "one");
        assert!(matches!(results[1], Err(ClientError::Stream(_))));
    }
}
