//! gemini-chat-client: Google Gemini backend for chat agents
//!
//! This library exposes [`GeminiChatClient`], an implementation of the
//! backend-agnostic [`ChatClient`] trait. It translates conversation messages
//! into Gemini `generateContent` requests and returns either the complete
//! reply or a lazy stream of incremental updates.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod error;
pub mod messages;
pub mod services;

// Re-exports for convenience
pub use config::{GeminiConfig, GenerationOptions};
pub use error::{ClientError, Result};
pub use messages::{Content, Message, Role};
pub use services::{ChatClient, ChatResponse, GeminiChatClient, ResponseUpdate, UpdateStream};
