use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BotError;
use crate::models::session::ChatMessage;

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

pub async fn query_openai(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, BotError> {
    let request = OpenAIRequest {
        model,
        messages,
        max_tokens: 1500,
        temperature: 0.7,
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!(model = %model, messages = messages.len(), "querying chat completions");
    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        warn!(status = %status, body = %text, "chat completion request failed");
        return Err(BotError::from_status(status, &text));
    }

    parse_completion(&text)
}

fn parse_completion(body: &str) -> Result<String, BotError> {
    let parsed: OpenAIResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| BotError::MalformedResponse("no choices in completion".to_string()))
}
