use super::{ModelInvoker, Role, Turn};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenAiInvoker {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiInvoker {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

fn build_request<'a>(
    model: &'a str,
    instructions: &'a str,
    turns: &'a [Turn],
    structured: bool,
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ChatMessage {
        role: Role::System,
        content: instructions,
    });
    messages.extend(turns.iter().map(|t| ChatMessage {
        role: t.role,
        content: &t.content,
    }));

    ChatRequest {
        model,
        messages,
        response_format: structured.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

fn first_content(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(ProviderError::EmptyCompletion)
}

#[async_trait]
impl ModelInvoker for OpenAiInvoker {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn invoke(
        &self,
        model: &str,
        instructions: &str,
        turns: &[Turn],
        structured: bool,
    ) -> Result<String, ProviderError> {
        let request = build_request(model, instructions, turns, structured);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        debug!(
            "Completion from {} ({} turns) in {:?}",
            model,
            turns.len(),
            start.elapsed()
        );
        first_content(parsed)
    }
}
