//! Chat-completion client for lyrics and titles.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TextConfig;
use crate::error::{MelodyError, Result};
use crate::types::{clean_title, Genre, Mood, Stage};

use super::http::{error_body, ApiEndpoint};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Prompt for the lyrics call. Missing keywords become "any".
pub fn lyrics_prompt(genre: Genre, mood: Mood, keywords: Option<&str>) -> String {
    let keywords = keywords.map(str::trim).filter(|k| !k.is_empty()).unwrap_or("any");
    format!(
        "Write song lyrics in {} style with a {} mood. Use themes: {}.",
        genre, mood, keywords
    )
}

/// Prompt for the title call.
pub fn title_prompt(lyrics: &str) -> String {
    format!("Give a short, catchy title for this song: {}", lyrics)
}

/// Produces lyrics and titles through a chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct TextGenerationClient {
    client: Client,
    endpoint: ApiEndpoint,
    config: TextConfig,
}

impl TextGenerationClient {
    pub fn new(client: Client, endpoint: ApiEndpoint, config: TextConfig) -> Self {
        Self {
            client,
            endpoint,
            config,
        }
    }

    /// Generates lyrics. Any failure is tagged with the lyrics stage.
    pub async fn generate_lyrics(
        &self,
        genre: Genre,
        mood: Mood,
        keywords: Option<&str>,
    ) -> Result<String> {
        let prompt = lyrics_prompt(genre, mood, keywords);
        let lyrics = self
            .complete(Stage::Lyrics, &prompt, self.config.lyrics_max_tokens)
            .await?;

        let lyrics = lyrics.trim();
        if lyrics.is_empty() {
            return Err(MelodyError::generation_failed(
                Stage::Lyrics,
                "model returned empty lyrics",
            ));
        }
        Ok(lyrics.to_string())
    }

    /// Generates a cleaned title for `lyrics`.
    ///
    /// A reply that is empty after stripping quotes counts as a failure.
    pub async fn generate_title(&self, lyrics: &str) -> Result<String> {
        let raw = self
            .complete(Stage::Title, &title_prompt(lyrics), self.config.title_max_tokens)
            .await?;
        clean_title(&raw).ok_or_else(|| {
            MelodyError::generation_failed(Stage::Title, "model returned an empty title")
        })
    }

    async fn complete(&self, stage: Stage, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens,
        };

        debug!(%stage, model = %self.config.model, max_tokens, "Sending chat completion");

        let response = self
            .client
            .post(self.endpoint.url(CHAT_COMPLETIONS_PATH))
            .bearer_auth(self.endpoint.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| MelodyError::transport(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(MelodyError::generation_failed(
                stage,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            MelodyError::generation_failed(stage, format!("invalid chat response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MelodyError::generation_failed(stage, "chat response has no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lyrics_prompt_uses_any_without_keywords() {
        assert_eq!(
            lyrics_prompt(Genre::HipHop, Mood::Chill, None),
            "Write song lyrics in Hip Hop style with a Chill mood. Use themes: any."
        );
        assert_eq!(
            lyrics_prompt(Genre::Rock, Mood::Sad, Some("  ")),
            "Write song lyrics in Rock style with a Sad mood. Use themes: any."
        );
        assert!(lyrics_prompt(Genre::Pop, Mood::Happy, Some("love, rain")).ends_with("love, rain."));
    }

    #[test]
    fn title_prompt_embeds_lyrics() {
        assert!(title_prompt("la la la").ends_with("la la la"));
    }

    #[test]
    fn chat_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello"));

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
