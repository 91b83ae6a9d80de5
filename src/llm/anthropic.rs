//! Anthropic Claude provider implementation

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use crate::conversation::{Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Opening user turn when a history holds nothing but system text
const OPENING_TURN: &str = "Begin the conversation.";

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl AnthropicService {
    pub fn new(api_key: String, model_id: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: API_URL.to_string(),
            model_id: model_id.into(),
        })
    }

    /// The Messages API takes system text out of band and only knows two
    /// roles. Leading system messages become `system`; later ones are sent
    /// as user turns so their position in the exchange survives.
    fn translate_request(&self, request: &LlmRequest) -> AnthropicRequest {
        let leading = request
            .messages
            .iter()
            .take_while(|m| m.role() == Role::System)
            .count();

        let system = request.messages[..leading]
            .iter()
            .map(|m| AnthropicSystemBlock {
                r#type: "text".to_string(),
                text: m.content().to_string(),
            })
            .collect();

        let mut messages: Vec<AnthropicMessage> = Vec::new();
        for message in &request.messages[leading..] {
            let (role, text) = Self::translate_message(message);
            match messages.last_mut() {
                // Consecutive same-role turns are merged into one message
                Some(last) if last.role == role => last.content.push(AnthropicContentBlock::Text { text }),
                _ => messages.push(AnthropicMessage {
                    role: role.to_string(),
                    content: vec![AnthropicContentBlock::Text { text }],
                }),
            }
        }

        // The exchange must open with a user turn
        if messages.first().map_or(true, |m| m.role != "user") {
            messages.insert(
                0,
                AnthropicMessage {
                    role: "user".to_string(),
                    content: vec![AnthropicContentBlock::Text {
                        text: OPENING_TURN.to_string(),
                    }],
                },
            );
        }

        AnthropicRequest {
            model: self.model_id.clone(),
            max_tokens: request.sampling.max_tokens,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            system,
            messages,
        }
    }

    fn translate_message(message: &Message) -> (&'static str, String) {
        match message.role() {
            Role::User => ("user", message.content().to_string()),
            Role::Assistant => ("assistant", message.content().to_string()),
            Role::System => ("user", format!("System: {}", message.content())),
        }
    }

    fn normalize_response(resp: AnthropicResponse) -> LlmResponse {
        let text = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("");

        LlmResponse {
            text,
            usage: Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let anthropic_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        let anthropic_response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e} - body: {body}")))?;

        Ok(Self::normalize_response(anthropic_response))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<AnthropicSystemBlock>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicSystemBlock {
    r#type: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    /// Block types this client never requests
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
