/// Maximum accepted upload size in bytes (30 MiB), enforced at the framework
/// boundary before the upload handler runs.
pub const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

/// Sessions older than this are evicted on the next lookup.
pub const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Free trial limit for non-admin users when the config does not override it.
pub const DEFAULT_FREE_TRIAL_LIMIT: i64 = 1;

/// Default speech-to-text model requested from the provider.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";

/// Default chat model used for summarization.
pub const DEFAULT_SUMMARY_MODEL: &str = "llama-3.3-70b-versatile";
