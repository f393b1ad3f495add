//! Process configuration from environment variables

use crate::session::DEFAULT_SESSION_IDLE_TTL;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 3036;
pub const DEFAULT_AUDIO_BASE_URL: &str =
    "https://alignthedeveloper.github.io/guitar-tuner-audio/audio/";
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TUNER_PORT `{value}`: {source}")]
    Port {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid TUNER_AUDIO_BASE_URL `{value}`: {source}")]
    AudioBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("TUNER_AUDIO_BASE_URL `{0}` cannot be used as a base URL")]
    NotABase(String),
    #[error("Invalid TUNER_SESSION_IDLE_SECS `{value}`: {source}")]
    SessionIdle {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Runtime settings for the skill server
#[derive(Debug, Clone)]
pub struct SkillConfig {
    pub port: u16,
    /// Directory containing `<token>.mp3` reference recordings
    pub audio_base_url: Url,
    /// Served for any path that is not a skill route
    pub static_dir: PathBuf,
    /// Sessions untouched for this long are dropped from the store
    pub session_idle_ttl: Duration,
}

impl SkillConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("TUNER_PORT") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::Port { value, source })?,
            None => DEFAULT_PORT,
        };

        let audio_value =
            lookup("TUNER_AUDIO_BASE_URL").unwrap_or_else(|| DEFAULT_AUDIO_BASE_URL.to_string());
        let audio_base_url = parse_audio_base(&audio_value)?;

        let static_dir = lookup("TUNER_STATIC_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        let session_idle_ttl = match lookup("TUNER_SESSION_IDLE_SECS") {
            Some(value) => value
                .parse()
                .map(Duration::from_secs)
                .map_err(|source| ConfigError::SessionIdle { value, source })?,
            None => DEFAULT_SESSION_IDLE_TTL,
        };

        Ok(Self {
            port,
            audio_base_url,
            static_dir,
            session_idle_ttl,
        })
    }
}

/// Parse the audio base, forcing a trailing slash so joins append
fn parse_audio_base(value: &str) -> Result<Url, ConfigError> {
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };

    let url = Url::parse(&normalized).map_err(|source| ConfigError::AudioBaseUrl {
        value: value.to_string(),
        source,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(value.to_string()));
    }
    Ok(url)
}
