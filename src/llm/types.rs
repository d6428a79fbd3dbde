use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// OpenAI-compatible `chat/completions` body.
    pub fn to_body(&self, model_id: &str) -> Value {
        let mut body = json!({
            "model": model_id,
            "messages": self.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = self.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = self.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_messages_and_optional_sampling() {
        let mut request = ChatRequest::new(vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("hi"),
        ]);
        let body = request.to_body("gpt-3.5-turbo");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!(body.get("temperature").is_none());

        request.temperature = Some(0.2);
        request.max_tokens = Some(256);
        let body = request.to_body("gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 256);
    }
}
