//! Upload input handling
//!
//! Two mutually exclusive input shapes arrive on the same multipart form: a
//! binary `file` part, or a `recorded_audio` field with base64 audio from the
//! in-browser recorder (plus optional `recorded_filename`). The selected
//! bytes are staged in a uniquely-named temp file for the transcription call
//! and removed afterwards, best-effort.

use axum::extract::Multipart;
use base64::Engine;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};

type DynError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_RECORDING_FILENAME: &str = "browser-recording.wav";

/// Audio bytes extracted from an upload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Raw multipart fields relevant to the upload handler
#[derive(Debug, Default)]
pub struct UploadFields {
    pub file: Option<(String, Vec<u8>)>,
    pub recorded_audio: Option<String>,
    pub recorded_filename: Option<String>,
}

impl UploadFields {
    /// Walk the multipart stream and collect the fields we care about
    pub async fn collect(multipart: &mut Multipart) -> Result<Self, DynError> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("file") => {
                    let filename = field
                        .file_name()
                        .map(|name| name.to_string())
                        .unwrap_or_default();
                    let content = field.bytes().await?.to_vec();
                    if !content.is_empty() {
                        fields.file = Some((filename, content));
                    }
                }
                Some("recorded_audio") => {
                    fields.recorded_audio = Some(field.text().await?);
                }
                Some("recorded_filename") => {
                    fields.recorded_filename = Some(field.text().await?);
                }
                _ => {}
            }
        }

        Ok(fields)
    }

    /// Resolve the collected fields into a single audio input.
    ///
    /// A device upload takes precedence over a browser recording. Returns
    /// Ok(None) when neither shape is present, which the handler treats as a
    /// user error. A base64 payload that fails to decode is an error.
    pub fn into_audio_input(self) -> Result<Option<AudioInput>, DynError> {
        if let Some((filename, content)) = self.file {
            let filename = if filename.is_empty() {
                "upload".to_string()
            } else {
                filename
            };
            return Ok(Some(AudioInput { filename, content }));
        }

        if let Some(encoded) = self.recorded_audio {
            let content = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| format!("Invalid base64 audio data: {}", e))?;
            let filename = self
                .recorded_filename
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_RECORDING_FILENAME.to_string());
            return Ok(Some(AudioInput { filename, content }));
        }

        Ok(None)
    }
}

/// Strip any path components from a client-supplied filename
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name
    }
}

/// A staged upload on disk. Removal is attempted explicitly after the
/// transcription call; the Drop impl is the fallback for early-return error
/// paths. Both are best-effort.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    removed: bool,
}

impl TempAudioFile {
    /// Write audio bytes under `dir` with a timestamp-prefixed name to avoid
    /// collisions between requests.
    pub fn create(dir: &Path, filename: &str, content: &[u8]) -> std::io::Result<Self> {
        let stamped = format!(
            "temp_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            sanitize_filename(filename)
        );
        let path = dir.join(stamped);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(content)?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Location of the staged file. Stays valid to call after removal; the
    /// file is just no longer there.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort removal, idempotent; failure is silently ignored
    pub fn remove(&mut self) {
        if !self.removed {
            self.removed = true;
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        self.remove();
    }
}
