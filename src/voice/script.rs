//! Voiceover script generation via a chat-completion API.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Result, VoiceError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default instruction handed to the model when the caller supplies none.
pub const DEFAULT_SCRIPT_PROMPT: &str = "Write a short, energetic voiceover script for a \
fast-cut social video reel. Two or three sentences, an inviting hook first, a call to action \
last. Plain spoken language, no hashtags, no emoji, no scene directions.";

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completion client that turns a prompt into a narration script.
pub struct ScriptGenerator {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl ScriptGenerator {
    /// Build a generator reading the API key from `OPENAI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| VoiceError::MissingCredential { env_var: "OPENAI_API_KEY".to_string() })?;
        Ok(Self::new(DEFAULT_BASE_URL, api_key, model))
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Generate a script from the given prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a professional short-form video script writer.".to_string(),
                },
                ChatMessage { role: "user".to_string(), content: prompt.to_string() },
            ],
            "temperature": 0.7,
            "max_tokens": 500,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::ScriptFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(VoiceError::ScriptFailed {
                reason: format!("completion returned {}", response.status()),
            }
            .into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::ScriptFailed { reason: e.to_string() })?;

        let script = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VoiceError::ScriptFailed { reason: "empty completion".to_string() })?;

        debug!(chars = script.len(), "generated voiceover script");
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generate_returns_the_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant",
                    "content": "  Catch the city at golden hour.  "}}]}"#,
            )
            .create_async()
            .await;

        let generator = ScriptGenerator::new(server.url(), "key", "gpt-4-turbo-preview");
        let script = generator.generate(DEFAULT_SCRIPT_PROMPT).await.unwrap();

        assert_eq!(script, "Catch the city at golden hour.");
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let generator = ScriptGenerator::new(server.url(), "key", "gpt-4-turbo-preview");
        assert!(generator.generate("anything").await.is_err());
    }

    #[tokio::test]
    async fn api_errors_surface_the_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let generator = ScriptGenerator::new(server.url(), "key", "gpt-4-turbo-preview");
        assert!(generator.generate("anything").await.is_err());
    }
}
