//! Summarizer seam and the chat-model backed implementation

use anyhow::{bail, Result};
use async_trait::async_trait;
use llm::{ChatMessage, ChatModel, ChatRequest};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::transcript::Transcript;

pub const DEFAULT_SUMMARY_LANGUAGE: &str = "English";
pub const DEFAULT_MAX_SUMMARY_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Everything a summarizer gets to see about one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub transcript: String,
    pub conversation_name: String,
    pub period: String,
    pub message_count: usize,
    pub participant_count: usize,
}

impl From<&Transcript> for SummaryRequest {
    fn from(transcript: &Transcript) -> Self {
        Self {
            transcript: transcript.body.clone(),
            conversation_name: transcript.conversation_name.clone(),
            period: transcript.period.clone(),
            message_count: transcript.message_count,
            participant_count: transcript.participant_count,
        }
    }
}

/// Turns a transcript into a short summary
///
/// Failures and empty output are both treated as "no summary" by callers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        (**self).summarize(request).await
    }
}

/// Summarizer backed by any `ChatModel`
pub struct LlmSummarizer {
    model: Arc<dyn ChatModel + Send + Sync>,
    language: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmSummarizer {
    pub fn new(model: Arc<dyn ChatModel + Send + Sync>) -> Self {
        Self {
            model,
            language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
            max_tokens: DEFAULT_MAX_SUMMARY_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn system_prompt(&self) -> String {
        format!(
            "You summarize group chat discussions. Write in {}. \
             Be concise and neutral, and do not invent details that are not in the chat.",
            self.language
        )
    }

    fn user_prompt(&self, request: &SummaryRequest) -> String {
        format!(
            "Summarize the following discussion from the group \"{name}\" ({period}, \
             {count} messages from {people} participants).\n\n\
             Cover:\n\
             1. Main topics of discussion\n\
             2. Key decisions or agreements\n\
             3. Important questions that were left open\n\
             4. The overall tone of the conversation\n\n\
             Keep the summary structured and between 300 and 400 words.\n\n\
             Discussion:\n\n{transcript}",
            name = request.conversation_name,
            period = request.period,
            count = request.message_count,
            people = request.participant_count,
            transcript = request.transcript,
        )
    }

    fn build_request(&self, request: &SummaryRequest) -> ChatRequest {
        let messages = [
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(request)),
        ];
        ChatRequest::new(&messages)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    #[instrument(level = "debug", skip_all, fields(messages = request.message_count))]
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let reply = self.model.chat(&self.build_request(request)).await?;
        let summary = reply.get_text().trim();
        if summary.is_empty() {
            bail!("model {} returned an empty summary", self.model.name());
        }
        debug!(chars = summary.len(), "summary generated");
        Ok(summary.to_string())
    }
}
