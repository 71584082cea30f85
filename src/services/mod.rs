//! Service layer for chat backends
//!
//! [`ChatClient`] is the capability an agent relies on; any backend that
//! implements it can be swapped in. This crate ships the Gemini backend.

pub mod adapters;
pub mod gemini;
pub mod streaming;

use std::{collections::HashMap, pin::Pin};

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    messages::{Content, Message, Role},
};

pub use gemini::GeminiChatClient;

/// Aggregated result of a non-streaming request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply messages; a single assistant message for Gemini
    pub messages: Vec<Message>,
    pub response_id: String,
}

impl ChatResponse {
    /// Concatenated text of all reply messages
    #[must_use]
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One incremental piece of a streamed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseUpdate {
    pub contents: Vec<Content>,
    pub role: Role,
}

impl ResponseUpdate {
    /// Assistant update carrying a single text chunk
    #[must_use]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::text(text)],
            role: Role::Assistant,
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.contents.iter().map(Content::as_text).collect()
    }
}

/// Lazy stream of updates; dropping it releases the underlying connection
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<ResponseUpdate>> + Send>>;

/// Core trait for chat backends
///
/// Implementations translate the neutral [`Message`] model into their own
/// wire format and back. They hold configuration only, so one instance can
/// serve concurrent calls.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the provider name (e.g., "gemini")
    fn provider(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;

    /// Extra backend-specific properties exposed to the agent
    fn additional_properties(&self) -> HashMap<String, serde_json::Value> {
        HashMap::new()
    }

    /// Send the conversation and wait for the complete reply
    async fn get_response(&self, messages: &[Message]) -> Result<ChatResponse>;

    /// Send the conversation and stream the reply chunk by chunk
    ///
    /// No I/O happens until the returned stream is first polled. Errors are
    /// yielded in-stream, after every chunk received before them.
    fn get_streaming_response(&self, messages: &[Message]) -> UpdateStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_text() {
        let update = ResponseUpdate::assistant_text("Hel");
        assert_eq!(update.role, Role::Assistant);
        assert_eq!(update.text(), "Hel");
    }

    #[test]
    fn test_response_text() {
        let response = ChatResponse {
            messages: vec![Message::assistant("T")],
            response_id: "R".into(),
        };
        assert_eq!(response.text(), "T");
    }
}
