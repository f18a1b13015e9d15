use crate::ChatModel;
use crate::client::Client;
use anyhow::Context;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;

use super::chat::OpenAIChatModel;

#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
}

const API_VERSION: &str = "v1";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

impl OpenAIProvider {
    pub fn default(api_key: &str) -> anyhow::Result<Self> {
        Self::new(DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider with a custom base URL (e.g., for proxying).
    /// The API version path (/v1) is automatically appended.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        Ok(OpenAIProvider {
            client: Client::with_headers(headers)?,
            base_url: versioned_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a chat model by name, returned as Arc for sharing across tasks
    pub fn create_chat_model(&self, model_name: &str) -> Arc<dyn ChatModel + Send + Sync> {
        Arc::new(OpenAIChatModel::new(
            self.client.clone(),
            self.base_url.clone(),
            model_name.to_string(),
        ))
    }
}

fn versioned_base_url(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if base_url.ends_with(API_VERSION) {
        base_url.to_string()
    } else {
        format!("{}/{}", base_url, API_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_base_url() {
        assert_eq!(versioned_base_url("https://api.openai.com"), "https://api.openai.com/v1");
        assert_eq!(versioned_base_url("http://proxy:8080/"), "http://proxy:8080/v1");
        assert_eq!(versioned_base_url("http://proxy:8080/v1"), "http://proxy:8080/v1");
    }

    #[test]
    fn test_invalid_api_key_is_an_error() {
        assert!(OpenAIProvider::default("bad\nkey").is_err());
    }

    #[test]
    fn test_create_chat_model() {
        let provider = OpenAIProvider::new("http://localhost:1234", "sk-test").unwrap();
        let model = provider.create_chat_model("gpt-4o-mini");
        assert_eq!(model.name(), "gpt-4o-mini");
        assert_eq!(provider.base_url(), "http://localhost:1234/v1");
    }
}
