//! Speech provider client
//!
//! Both transcription and summarization are delegated to Groq's
//! OpenAI-compatible HTTP API. Handlers depend on the [`SpeechService`] trait
//! rather than the concrete client so tests can substitute a mock backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

type DynError = Box<dyn std::error::Error + Send + Sync>;

const TRANSCRIPTION_ENDPOINT: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Fixed instruction for the summarization turn. The transcript is passed as
/// the user message.
const SUMMARY_SYSTEM_PROMPT: &str = "Summarize the given data in a well arranged manner. \
Use headings and subheadings without overdoing it and make sure they are the best possible \
way to summarize the given data. Do not use hr elements. Do not include any message from \
your side. You are dealing with important data, so make sure that you do not miss any \
important details in it. Give your answer in markdown format.";

/// External speech collaborators: speech-to-text plus summarization
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Transcribe the audio file at `audio_path`. `filename` is the original
    /// upload name forwarded to the provider as a format hint.
    async fn transcribe(&self, audio_path: &Path, filename: &str) -> Result<String, DynError>;

    /// Summarize a raw transcript into structured markdown
    async fn summarize(&self, transcript: &str) -> Result<String, DynError>;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// HTTP client for the Groq API
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    transcription_model: String,
    summary_model: String,
}

impl GroqClient {
    pub fn new(
        api_key: String,
        transcription_model: String,
        summary_model: String,
    ) -> Result<Self, DynError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_key,
            transcription_model,
            summary_model,
        })
    }
}

#[async_trait]
impl SpeechService for GroqClient {
    async fn transcribe(&self, audio_path: &Path, filename: &str) -> Result<String, DynError> {
        let audio = tokio::fs::read(audio_path).await?;

        let audio_part = Part::bytes(audio).file_name(filename.to_string());
        let form = Form::new()
            .part("file", audio_part)
            .text("model", self.transcription_model.clone());

        let response = self
            .http
            .post(TRANSCRIPTION_ENDPOINT)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Transcription request failed ({}): {}", status, body).into());
        }

        let result: TranscriptionResponse = response.json().await?;
        Ok(result.text)
    }

    async fn summarize(&self, transcript: &str) -> Result<String, DynError> {
        let body = serde_json::json!({
            "model": self.summary_model,
            "messages": [
                { "role": "system", "content": SUMMARY_SYSTEM_PROMPT },
                { "role": "user", "content": transcript },
            ],
        });

        let response = self
            .http
            .post(CHAT_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Summarization request failed ({}): {}", status, body).into());
        }

        let result: ChatResponse = response.json().await?;
        let summary = result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or("Summarization response contained no choices")?;
        Ok(summary)
    }
}
