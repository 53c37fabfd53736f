use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Credentials file structure
///
/// Format:
/// ```toml
/// [postgres.profile_name]
/// password = "your_postgres_password_here"
///
/// [groq.profile_name]
/// api_key = "your_groq_api_key_here"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub postgres: HashMap<String, PostgresProfile>,
    #[serde(default)]
    pub groq: HashMap<String, GroqProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresProfile {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroqProfile {
    pub api_key: String,
}

/// Get the default credentials file path: ~/.config/audio_scribe/credentials.toml
pub fn get_credentials_path() -> PathBuf {
    let home = std::env::var("HOME").expect("HOME environment variable not set");
    PathBuf::from(home)
        .join(".config")
        .join("audio_scribe")
        .join("credentials.toml")
}

/// Load credentials from the default location
/// Returns None if the file doesn't exist
pub fn load_credentials() -> Result<Option<Credentials>, Box<dyn std::error::Error + Send + Sync>> {
    let creds_path = get_credentials_path();

    if !creds_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&creds_path)?;
    let credentials: Credentials = toml::from_str(&content)?;

    Ok(Some(credentials))
}

/// Resolve the Postgres password: POSTGRES_PASSWORD env var first, then the
/// named profile in the credentials file.
pub fn resolve_postgres_password(
    credentials: &Option<Credentials>,
    profile: Option<&str>,
) -> Result<String, String> {
    if let Ok(password) = std::env::var("POSTGRES_PASSWORD") {
        if !password.is_empty() {
            return Ok(password);
        }
    }

    let profile = profile.ok_or_else(|| {
        "POSTGRES_PASSWORD not set and no postgres credential_profile configured".to_string()
    })?;

    match credentials {
        Some(creds) => creds
            .postgres
            .get(profile)
            .map(|p| p.password.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[postgres.{}]' not found in credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found. Expected at: {}",
            get_credentials_path().display()
        )),
    }
}

/// Resolve the speech provider API key: GROQ_API_KEY env var first, then the
/// named profile in the credentials file.
pub fn resolve_groq_api_key(
    credentials: &Option<Credentials>,
    profile: Option<&str>,
) -> Result<String, String> {
    if let Ok(key) = std::env::var("GROQ_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let profile = profile.ok_or_else(|| {
        "GROQ_API_KEY not set and no groq credential_profile configured".to_string()
    })?;

    match credentials {
        Some(creds) => creds
            .groq
            .get(profile)
            .map(|p| p.api_key.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[groq.{}]' not found in credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found. Expected at: {}",
            get_credentials_path().display()
        )),
    }
}
