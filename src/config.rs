use serde::Deserialize;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_FREE_TRIAL_LIMIT, DEFAULT_SUMMARY_MODEL, DEFAULT_TRANSCRIPTION_MODEL,
};

fn default_port() -> u16 {
    5000
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_free_trial_limit() -> i64 {
    DEFAULT_FREE_TRIAL_LIMIT
}

fn default_transcription_model() -> String {
    DEFAULT_TRANSCRIPTION_MODEL.to_string()
}

fn default_summary_model() -> String {
    DEFAULT_SUMMARY_MODEL.to_string()
}

/// Application configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Port to listen on (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for temporary upload storage (default: uploads)
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Completed transcriptions allowed per non-admin user (default: 1)
    #[serde(default = "default_free_trial_limit")]
    pub free_trial_limit: i64,
    /// PostgreSQL connection settings. When absent the app runs in
    /// local-only mode without authentication or history saving.
    pub postgres: Option<PostgresConfig>,
    /// Speech provider settings (maps to [speech] section in TOML)
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// PostgreSQL configuration (maps to [postgres] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// Base PostgreSQL URL without database (e.g., postgres://user@host:5432)
    pub base_url: String,
    /// Database name
    pub database: String,
    /// Credential profile name to look up the password from
    /// ~/.config/audio_scribe/credentials.toml (POSTGRES_PASSWORD wins)
    pub credential_profile: Option<String>,
}

/// Speech provider configuration (maps to [speech] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Speech-to-text model (default: whisper-large-v3-turbo)
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Summarization model (default: llama-3.3-70b-versatile)
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    /// Credential profile name for the API key (GROQ_API_KEY wins)
    pub credential_profile: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            transcription_model: default_transcription_model(),
            summary_model: default_summary_model(),
            credential_profile: None,
        }
    }
}

impl AppConfig {
    /// Validate settings that cannot be expressed through serde defaults
    pub fn validate(&self) -> Result<(), String> {
        if self.free_trial_limit < 0 {
            return Err("free_trial_limit must not be negative".to_string());
        }
        if self.speech.transcription_model.is_empty() {
            return Err("speech.transcription_model must not be empty".to_string());
        }
        if self.speech.summary_model.is_empty() {
            return Err("speech.summary_model must not be empty".to_string());
        }
        Ok(())
    }
}
