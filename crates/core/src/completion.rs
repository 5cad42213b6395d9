use crate::traits::ChatCompletion;
use crate::CompletionError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";
pub const DEFAULT_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl AzureOpenAiConfig {
    /// Returns `None` unless both endpoint and key are non-blank; a missing
    /// model is a supported way to run.
    pub fn from_parts(
        endpoint: Option<&str>,
        api_key: Option<&str>,
        deployment: Option<&str>,
    ) -> Option<Self> {
        let endpoint = non_blank(endpoint)?;
        let api_key = non_blank(api_key)?;
        let deployment = non_blank(deployment).unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());

        Some(Self {
            endpoint,
            api_key,
            deployment,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn chat_completions_url(&self) -> Result<Url, CompletionError> {
        let mut url = Url::parse(self.endpoint.trim_end_matches('/'))?.join(&format!(
            "/openai/deployments/{}/chat/completions",
            self.deployment
        ))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion over an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    url: Url,
    api_key: String,
    client: Client,
}

impl AzureOpenAiClient {
    pub fn new(config: &AzureOpenAiConfig) -> Result<Self, CompletionError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            url: config.chat_completions_url()?,
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl ChatCompletion for AzureOpenAiClient {
    async fn complete(&self, system_prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "system",
                content: system_prompt,
            }],
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::BackendResponse {
                backend: "azure-openai".to_string(),
                details: format!("{status}: {body}"),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = choice_content(parsed)?;
        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

fn choice_content(response: ChatResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(CompletionError::EmptyResponse)
}
