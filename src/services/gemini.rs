//! Google Gemini API adapter
//!
//! Talks to the Generative Language REST API:
//! - `POST /v1beta/{model}:generateContent` for complete replies
//! - `POST /v1beta/{model}:streamGenerateContent?alt=sse` for streamed replies

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    config::{GeminiConfig, GenerationOptions},
    error::{ClientError, Result},
    messages::Message,
};

use super::{adapters, streaming, ChatClient, ChatResponse, UpdateStream};

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini chat client
#[derive(Debug, Clone)]
pub struct GeminiChatClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiChatClient {
    /// Create a new Gemini client
    ///
    /// Without an API key the client is still built; Gemini then rejects its
    /// requests with an authentication error.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the HTTP
    /// client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value = header::HeaderValue::from_str(api_key)
                .map_err(|_| ClientError::InvalidConfig("Invalid API key format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        } else {
            warn!("no Gemini API key configured, requests will be unauthenticated");
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, config })
    }

    /// Create a client for `model` using `GEMINI_API_KEY` from the environment
    ///
    /// # Errors
    ///
    /// See [`GeminiChatClient::new`]
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        Self::new(GeminiConfig::from_env(model))
    }

    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/{}/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            API_VERSION,
            self.config.model_path(),
            method
        )
    }

    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        adapters::to_gemini_request(messages, self.config.generation.as_ref())
    }
}

/// Send a request and turn a non-success status into [`ClientError::Api`]
async fn send(client: &Client, url: &str, request: &GenerateContentRequest) -> Result<Response> {
    debug!(url, entries = request.contents.len(), "sending Gemini request");

    let response = client.post(url).json(request).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        warn!(status = status.as_u16(), "Gemini request failed");
        return Err(api_error(status.as_u16(), &body));
    }

    Ok(response)
}

/// Decode Gemini's error envelope, falling back to the raw body
fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.into_client_error(status),
        Err(_) => ClientError::Api {
            status,
            code: None,
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn get_response(&self, messages: &[Message]) -> Result<ChatResponse> {
        let request = self.build_request(messages);
        let response = send(&self.client, &self.endpoint("generateContent"), &request).await?;

        let reply: GenerateContentResponse = response.json().await?;
        Ok(adapters::to_chat_response(&reply))
    }

    fn get_streaming_response(&self, messages: &[Message]) -> UpdateStream {
        let request = self.build_request(messages);
        let client = self.client.clone();
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));

        Box::pin(async_stream::stream! {
            let response = match send(&client, &url, &request).await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let mut events = Box::pin(streaming::sse_events(response.bytes_stream()));

            while let Some(event) = events.next().await {
                match event.and_then(|event| decode_chunk(&event.data)) {
                    Ok(chunk) => {
                        trace!(text_len = chunk.text().len(), "Gemini stream chunk");
                        yield Ok(adapters::to_response_update(&chunk));
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }
}

/// Decode one SSE payload
///
/// Any payload carrying an `error` key is an error, whatever its shape.
fn decode_chunk(data: &str) -> Result<GenerateContentResponse> {
    let mut payload: serde_json::Value = serde_json::from_str(data)?;
    if let Some(error) = payload.get_mut("error").map(serde_json::Value::take) {
        return Err(stream_error(error));
    }
    Ok(serde_json::from_value(payload)?)
}

/// Error raised after streaming began; Gemini's status line was already 200
fn stream_error(error: serde_json::Value) -> ClientError {
    const FALLBACK_STATUS: u16 = 500;

    if let serde_json::Value::String(message) = error {
        return ClientError::Api {
            status: FALLBACK_STATUS,
            code: None,
            message,
        };
    }

    match serde_json::from_value::<GeminiErrorBody>(error.clone()) {
        Ok(body) => body.into_client_error(FALLBACK_STATUS),
        Err(_) => ClientError::Api {
            status: FALLBACK_STATUS,
            code: None,
            message: error.to_string(),
        },
    }
}

// Gemini API types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeminiRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Wire form of [`GenerationOptions`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl From<&GenerationOptions> for GenerationConfig {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            max_output_tokens: options.max_output_tokens,
            stop_sequences: options.stop_sequences.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<GeminiRole>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Content part; only text parts are produced, other kinds are read past
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl GeminiPart {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, thought parts excluded
    #[must_use]
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiErrorBody {
    fn into_client_error(self, fallback_status: u16) -> ClientError {
        ClientError::Api {
            status: self.code.unwrap_or(fallback_status),
            code: self.status,
            message: self.message,
        }
    }
}
