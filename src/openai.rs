use reqwest;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

macro_rules! debug_println {
    ($($arg:tt)*) => {
        if std::env::var("TABCHAT_DEBUG").is_ok() {
            eprintln!($($arg)*);
        }
    };
}

pub const AVAILABLE_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

const SYSTEM_PROMPT: &str = "You are a helpful data analyst. Always format your responses with \
markdown for better readability. Use headers (###), bullet points (-), and **bold** text \
appropriately.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// The data and the question are embedded literally, in that order. No
// truncation or escaping is applied.
fn build_user_prompt(data: &str, question: &str) -> String {
    format!(
        "You are an expert data analyst assistant. The user has provided data below \
and wants you to analyze it. Please provide clear, well-formatted responses using \
markdown formatting (headers with ###, bullet points with -, **bold** text) \
to make your analysis easy to read and understand.\n\n\
Data:\n{}\n\nQuestion: {}\n\n\
Please provide a comprehensive analysis with proper formatting.",
        data, question
    )
}

// Raised eagerly at configuration time; an unsupported model never reaches
// the request path.
pub fn validate_model(model: &str) -> Result<(), ChatError> {
    if !AVAILABLE_MODELS.contains(&model) {
        return Err(ChatError::ModelConfiguration {
            model: model.to_string(),
            available: AVAILABLE_MODELS.to_vec(),
        });
    }
    Ok(())
}

pub struct OpenAiClient {
    api_base: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn with_config(api_base: String, api_key: String, model: String) -> Self {
        OpenAiClient {
            api_base,
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    #[allow(dead_code)]
    pub fn get_model(&self) -> &str {
        &self.model
    }

    /// Switches to another supported model; rejects anything outside
    /// [`AVAILABLE_MODELS`] without touching the current setting.
    #[allow(dead_code)]
    pub fn set_model(&mut self, model: &str) -> Result<(), ChatError> {
        validate_model(model)?;
        self.model = model.to_string();
        Ok(())
    }

    pub async fn ask(&self, data: &str, question: &str) -> Result<String, ChatError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: build_user_prompt(data, question),
                },
            ],
            temperature: 0.1,
            max_tokens: 3000,
        };

        let url = format!("{}/chat/completions", self.api_base);
        debug_println!("POST {} model={}", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Service(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Service(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Service(extract_error_detail(status, &body)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::Service(format!("malformed response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Service("response contained no choices".to_string()))?;

        Ok(choice.message.content.trim().to_string())
    }
}

// Auth/quota failures come back as an error body with a human-readable
// message; fall back to the HTTP status line when the body has none.
fn extract_error_detail(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => format!("HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_data_before_question() {
        let prompt = build_user_prompt("a,b\n1,2", "sum column a");
        let data_at = prompt.find("a,b\n1,2").unwrap();
        let question_at = prompt.find("sum column a").unwrap();
        assert!(data_at < question_at);
    }

    #[test]
    fn set_model_rejects_unknown() {
        let mut client = OpenAiClient::with_config(
            "https://api.openai.com/v1".to_string(),
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
        );
        assert!(matches!(
            client.set_model("gpt-unknown"),
            Err(ChatError::ModelConfiguration { .. })
        ));
        assert_eq!(client.get_model(), "gpt-4o-mini");

        client.set_model("gpt-4o").unwrap();
        assert_eq!(client.get_model(), "gpt-4o");
    }

    #[test]
    fn error_detail_prefers_body_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            extract_error_detail(reqwest::StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
        assert_eq!(
            extract_error_detail(reqwest::StatusCode::BAD_GATEWAY, "not json"),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn response_body_parses() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": " hi "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, " hi ");
    }
}
