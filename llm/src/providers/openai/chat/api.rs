use crate::api::{ChatMessage, ChatRequest, Role};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<&ChatMessage> for Message {
    fn from(msg: &ChatMessage) -> Self {
        Message {
            role: msg.role,
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    pub fn from_request(model: String, request: &ChatRequest) -> Self {
        ChatCompletionRequest {
            model,
            messages: request.messages.iter().map(|m| m.into()).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
}

impl TryFrom<ChatCompletionResponse> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(response: ChatCompletionResponse) -> anyhow::Result<Self> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Completion {} returned no choices", response.id))?;

        let text = choice.message.content.unwrap_or_default();
        Ok(ChatMessage::assistant(text.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_unset_options() {
        let messages = vec![ChatMessage::user("hello")];
        let request = ChatCompletionRequest::from_request("gpt-4o-mini".to_string(), &ChatRequest::new(&messages));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_request_carries_sampling_options() {
        let messages = vec![ChatMessage::system("sys")];
        let request = ChatRequest::new(&messages).with_max_tokens(500);
        let request = ChatCompletionRequest::from_request("m".to_string(), &request);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn test_response_to_message() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "  The group planned a trip.  "},
                "finish_reason": "stop"
            }]
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let message = ChatMessage::try_from(response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.get_text(), "The group planned a trip.");
    }

    #[test]
    fn test_response_without_choices_is_an_error() {
        let body = r#"{"id": "chatcmpl-2", "model": "gpt-4o-mini", "choices": []}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(ChatMessage::try_from(response).is_err());
    }
}
