mod openai;

pub use openai::OpenAiInvoker;

use crate::config::Config;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation sent after the system instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion request against a language-model endpoint.
///
/// Implementations make exactly one outbound call per `invoke` and never
/// retry; any transport or endpoint failure is returned as-is.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    #[allow(dead_code)]
    fn name(&self) -> &'static str;

    async fn invoke(
        &self,
        model: &str,
        instructions: &str,
        turns: &[Turn],
        structured: bool,
    ) -> Result<String, ProviderError>;
}

/// Create the invoker described by the provider section of the config
pub fn create_invoker(config: &Config) -> Result<Arc<dyn ModelInvoker>, ProviderError> {
    let api_key = std::env::var(&config.provider.api_key_env)
        .map_err(|_| ProviderError::MissingApiKey(config.provider.api_key_env.clone()))?;

    let invoker = OpenAiInvoker::new(
        &config.provider.base_url,
        api_key,
        Duration::from_secs(config.provider.timeout_sec),
    )?;
    Ok(Arc::new(invoker))
}
