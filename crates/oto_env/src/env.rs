//! The environment value handed to the hosted router on every fetch.

use crate::blob::BlobBinding;
use crate::sql::{Database, RelationalBinding};
use std::sync::Arc;

/// Bindings plus pass-through flags. Built once at startup and shared by
/// every exchange; the host threads the flags through without acting on
/// them.
#[derive(Clone)]
pub struct Env {
    pub audio_db: Database,
    pub audio_bucket: Arc<dyn BlobBinding>,
    pub flags: EnvFlags,
}

impl Env {
    pub fn new(
        db: Arc<dyn RelationalBinding>,
        bucket: Arc<dyn BlobBinding>,
        flags: EnvFlags,
    ) -> Self {
        Self {
            audio_db: Database::new(db),
            audio_bucket: bucket,
            flags,
        }
    }
}

/// Feature toggles and credentials consumed by the hosted router, never
/// interpreted here. Unset variables come through as disabled or empty.
#[derive(Debug, Clone, Default)]
pub struct EnvFlags {
    pub authentication_enabled: bool,
    pub tts_enabled: bool,
    pub api_keys: String,
    pub tts_access_key_id: String,
    pub tts_secret_access_key: String,
}

impl EnvFlags {
    /// Read the pass-through variables from the process environment.
    /// Boolean flags are enabled only by the literal string `true`.
    pub fn from_process_env() -> Self {
        Self {
            authentication_enabled: flag_var("AUTHENTICATION_ENABLED"),
            tts_enabled: flag_var("TTS_ENABLED"),
            api_keys: string_var("API_KEYS"),
            tts_access_key_id: string_var("TTS_ACCESS_KEY_ID"),
            tts_secret_access_key: string_var("TTS_SECRET_ACCESS_KEY"),
        }
    }
}

fn string_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn flag_var(name: &str) -> bool {
    std::env::var(name).map(|v| v == "true").unwrap_or(false)
}
