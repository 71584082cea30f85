//! Translation between the neutral message model and Gemini's wire format
//!
//! Everything here is pure: no I/O, no state, no validation of the input
//! shape.

use uuid::Uuid;

use crate::{
    config::GenerationOptions,
    messages::{Message, Role},
};

use super::{
    gemini::{
        GeminiContent, GeminiPart, GeminiRole, GenerateContentRequest, GenerateContentResponse,
        GenerationConfig,
    },
    ChatResponse, ResponseUpdate,
};

/// Map an agent role onto Gemini's two roles
#[must_use]
pub fn gemini_role(role: Role) -> GeminiRole {
    match role {
        Role::Assistant => GeminiRole::Model,
        Role::User | Role::System | Role::Tool => GeminiRole::User,
    }
}

/// Flatten messages into Gemini contents
///
/// Each content item becomes its own entry tagged with its message's role.
/// Items of one message are not merged, and order is preserved.
#[must_use]
pub fn to_gemini_contents(messages: &[Message]) -> Vec<GeminiContent> {
    messages
        .iter()
        .flat_map(|msg| {
            let role = gemini_role(msg.role);
            msg.contents.iter().map(move |content| GeminiContent {
                role: Some(role),
                parts: vec![GeminiPart::text(content.as_text())],
            })
        })
        .collect()
}

/// Build the request body shared by the streaming and non-streaming endpoints
#[must_use]
pub fn to_gemini_request(
    messages: &[Message],
    generation: Option<&GenerationOptions>,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: to_gemini_contents(messages),
        generation_config: generation.filter(|g| !g.is_empty()).map(GenerationConfig::from),
    }
}

/// Wrap a complete Gemini reply as one assistant message
///
/// Gemini normally assigns a `responseId`. When it is missing, a random UUID
/// is substituted so the id is always a usable string; nothing marks such an
/// id as locally generated, so callers cannot tell it apart from Gemini's.
/// An absent id is never rendered as the string `"None"`.
#[must_use]
pub fn to_chat_response(response: &GenerateContentResponse) -> ChatResponse {
    let response_id = response
        .response_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ChatResponse {
        messages: vec![Message::assistant(response.text())],
        response_id,
    }
}

/// Turn one streamed chunk into an update
#[must_use]
pub fn to_response_update(chunk: &GenerateContentResponse) -> ResponseUpdate {
    ResponseUpdate::assistant_text(chunk.text())
}
