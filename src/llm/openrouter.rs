//! OpenRouter client implementation
//!
//! Async HTTP client for OpenRouter's OpenAI-compatible chat completions API,
//! with both single-shot and server-sent-event streaming replies.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::core::{preview, AgentError, Config, Message, Result};
use crate::llm::traits::{
    GenerateOptions, LLMProvider, LLMResponse, StreamChunk, StreamResponse, TokenUsage,
};

/// OpenRouter API client
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: Url,
    model: String,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Chat completions response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// One `data:` payload of a streaming response
#[derive(Debug, Deserialize)]
struct StreamChunkResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Error body returned by OpenRouter, both as a response and mid-stream
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// What a single server-sent-event line means for the reply
#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Skip,
}

/// Splits a byte stream into complete lines.
///
/// Buffers raw bytes so a UTF-8 sequence split across network chunks is
/// decoded only once the whole line has arrived.
#[derive(Debug, Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        (!rest.is_empty()).then_some(rest)
    }
}

/// Interpret one line of a chat completions event stream
fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let line = line.trim();

    // Blank separators and `: OPENROUTER PROCESSING` keep-alives
    if line.is_empty() || line.starts_with(':') {
        return Ok(SseEvent::Skip);
    }

    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: StreamChunkResponse = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(AgentError::provider(error.message));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|delta| delta.content))
        .collect();

    if text.is_empty() {
        Ok(SseEvent::Skip)
    } else {
        Ok(SseEvent::Delta(text))
    }
}

/// Turn a streaming HTTP response into reply fragments followed by the
/// complete message. Yields nothing at all when the model produced no text.
fn reply_stream(response: reqwest::Response) -> impl Stream<Item = Result<StreamChunk>> + Send {
    try_stream! {
        let mut bytes = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut content = String::new();
        let mut done = false;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| AgentError::provider(format!("Stream error: {}", e)))?;

            for line in lines.push(&chunk) {
                match parse_sse_line(&line)? {
                    SseEvent::Delta(text) => {
                        content.push_str(&text);
                        yield StreamChunk::Delta(text);
                    }
                    SseEvent::Done => {
                        done = true;
                        break;
                    }
                    SseEvent::Skip => trace!(line = %line, "skipping stream line"),
                }
            }

            if done {
                break;
            }
        }

        if !done {
            if let Some(line) = lines.finish() {
                if let SseEvent::Delta(text) = parse_sse_line(&line)? {
                    content.push_str(&text);
                    yield StreamChunk::Delta(text);
                }
            }
        }

        if !content.is_empty() {
            debug!(chars = content.len(), "stream complete");
            yield StreamChunk::complete(content);
        }
    }
}

impl OpenRouterClient {
    /// Create a new OpenRouter client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let headers = Self::default_headers(
            api_key,
            config.openrouter.site_url.as_deref(),
            config.openrouter.site_name.as_deref(),
        )?;

        // No overall deadline: a streamed reply stays open while fragments arrive
        let mut builder = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.openrouter.connect_timeout_secs));
        if let Some(secs) = config.openrouter.read_timeout_secs {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| AgentError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: Self::endpoint(&config.openrouter.base_url)?,
            model: config.openrouter.model.clone(),
        })
    }

    /// Chat completions URL under the given API base
    fn endpoint(base_url: &str) -> Result<Url> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|url| url.join("chat/completions"))
            .map_err(|e| AgentError::config(format!("Invalid base URL '{}': {}", base_url, e)))
    }

    /// Bearer auth plus OpenRouter's optional attribution headers
    fn default_headers(
        api_key: &str,
        site_url: Option<&str>,
        site_name: Option<&str>,
    ) -> Result<HeaderMap> {
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| AgentError::config(format!("Invalid header value: {}", e)))
        };

        let mut headers = HeaderMap::new();
        let mut auth = header(&format!("Bearer {}", api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        if let Some(url) = site_url {
            headers.insert(HeaderName::from_static("http-referer"), header(url)?);
        }
        if let Some(name) = site_name {
            headers.insert(HeaderName::from_static("x-title"), header(name)?);
        }

        Ok(headers)
    }

    /// Map a non-success status and its body to an error
    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::auth(format!(
                "OpenRouter rejected the request ({}): {}",
                status, message
            )),
            _ => AgentError::provider(format!("OpenRouter API error ({}): {}", status, message)),
        }
    }

    /// Post a chat request and check the status
    async fn send(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            stream,
            request = %preview(&serde_json::to_string(&request)?, 500),
            "sending chat request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AgentError::provider(format!(
                        "Cannot connect to OpenRouter at {}",
                        self.endpoint
                    ))
                } else {
                    AgentError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMProvider for OpenRouterClient {
    async fn chat(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let response = self.send(messages, options, false).await?;
        let response_text = response.text().await?;
        debug!(response = %preview(&response_text, 500), "chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| AgentError::provider(format!("Failed to parse response: {}", e)))?;

        // OpenRouter can report upstream failures inside a 200 response
        if let Some(error) = chat_response.error {
            return Err(AgentError::provider(error.message));
        }

        let usage = chat_response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        if let Some(ref usage) = usage {
            debug!(
                prompt = usage.prompt_tokens,
                completion = usage.completion_tokens,
                total = usage.total_tokens,
                "token usage"
            );
        }

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::provider("Response contained no choices"))?
            .message
            .content
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            usage,
            model: chat_response.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<StreamResponse> {
        let response = self.send(messages, options, true).await?;
        Ok(Box::pin(reply_stream(response)))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}
