//! Speech synthesis via a hosted TTS API.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::debug;

use crate::error::{Result, VoiceError};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Voice tuning passed through to the synthesis request.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self { stability: 0.5, similarity_boost: 0.75, style: 1.0, use_speaker_boost: true }
    }
}

/// TTS client keyed by a voice id; responses are raw audio bytes.
pub struct SpeechSynthesizer {
    base_url: String,
    api_key: String,
    voice_id: String,
    model: String,
    settings: VoiceSettings,
    http: reqwest::Client,
}

impl SpeechSynthesizer {
    /// Build a synthesizer reading the API key from `ELEVEN_LABS_API_KEY`.
    pub fn from_env(voice_id: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ELEVEN_LABS_API_KEY").map_err(|_| {
            VoiceError::MissingCredential { env_var: "ELEVEN_LABS_API_KEY".to_string() }
        })?;
        Ok(Self::new(DEFAULT_BASE_URL, api_key, voice_id, model))
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model: model.into(),
            settings: VoiceSettings::default(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_settings(mut self, settings: VoiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Synthesize `text` and write the audio to `output`.
    pub async fn synthesize(&self, text: &str, output: impl AsRef<Path>) -> Result<PathBuf> {
        let output = output.as_ref();
        let body = json!({
            "text": text,
            "model_id": self.model,
            "voice_settings": {
                "stability": self.settings.stability,
                "similarity_boost": self.settings.similarity_boost,
                "style": self.settings.style,
                "use_speaker_boost": self.settings.use_speaker_boost,
            },
        });

        let response = self
            .http
            .post(format!("{}/text-to-speech/{}", self.base_url, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::SynthesisFailed { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(VoiceError::SynthesisFailed {
                reason: format!("synthesis returned {}", response.status()),
            }
            .into());
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| VoiceError::SynthesisFailed { reason: e.to_string() })?;
        if audio.is_empty() {
            return Err(VoiceError::SynthesisFailed { reason: "empty audio response".to_string() }.into());
        }

        tokio::fs::write(output, &audio).await?;
        debug!(bytes = audio.len(), output = %output.display(), "synthesized narration");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn synthesis_writes_the_audio_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/text-to-speech/voice-1")
            .with_status(200)
            .with_body(b"ID3 fake mp3 bytes")
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url(), "key", "voice-1", "eleven_multilingual_v2");
        let dir = tempdir().unwrap();
        let out = dir.path().join("narration.mp3");

        synth.synthesize("Hello there", &out).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"ID3 fake mp3 bytes");
    }

    #[tokio::test]
    async fn empty_audio_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/text-to-speech/voice-1")
            .with_status(200)
            .with_body(b"")
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url(), "key", "voice-1", "eleven_multilingual_v2");
        let dir = tempdir().unwrap();

        assert!(synth.synthesize("Hello", dir.path().join("n.mp3")).await.is_err());
    }
}
