use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GatewayConfig;

use super::error::UpstreamError;

/// Client for the external completion service (OpenAI-compatible API).
pub struct CompletionClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    image_model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageReference>,
}

#[derive(Debug, Deserialize)]
struct ImageReference {
    url: String,
}

impl CompletionClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .context("failed to build completion service client")?;

        Ok(Self {
            http_client,
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
            api_key: config.upstream_api_key.clone(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    /// Send a single user message and return the generated reply text.
    pub async fn chat(&self, message: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: message.to_string(),
            }],
        };

        debug!(model = %self.chat_model, "sending chat completion request");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                UpstreamError::MalformedResponse("completion contained no choices".into())
            })?;

        info!(reply_len = reply.len(), "chat completion received");
        Ok(reply)
    }

    /// Generate an image and return its reference URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let request = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            size: "1024x1024".to_string(),
        };

        debug!(model = %self.image_model, "sending image generation request");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        let generation: ImageGenerationResponse = response.json().await?;

        generation
            .data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| {
                UpstreamError::MalformedResponse("image response contained no data".into())
            })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_string());
    Err(UpstreamError::Status { status, body })
}
