//! Application Configuration Module
//!
//! Loads the tutor's settings from environment variables (and a `.env` file
//! when present) into a single struct built once at startup.

use lumina_core::AudioFormat;
use lumina_core::audio::DEFAULT_SPEECH_SAMPLE_RATE;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// Accepted speech payload rates.
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8000..=384000;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The generative-AI backend answering the tutor's requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
    /// Canned replies and a test tone; needs no credentials.
    Offline,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub chat_model: Option<String>,
    pub image_model: Option<String>,
    pub speech_model: Option<String>,
    pub speech_voice: Option<String>,
    pub audio_format: AudioFormat,
    pub output_device: Option<String>,
    pub prompts_path: PathBuf,
    pub log_level: Level,
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{value}': {e}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `TUTOR_PROVIDER`: "gemini" (default), "openai" or "offline".
    // *   `GEMINI_API_KEY` / `OPENAI_API_KEY`: required by the matching provider.
    // *   `CHAT_MODEL`, `IMAGE_MODEL`, `SPEECH_MODEL`, `SPEECH_VOICE`: (Optional) provider overrides.
    // *   `AUDIO_SAMPLE_RATE`, `AUDIO_CHANNELS`: PCM layout of speech payloads. Defaults to 24000 Hz mono.
    // *   `OUTPUT_DEVICE`: (Optional) cpal output device name.
    // *   `PROMPTS_PATH`: (Optional) directory of prompt overrides. Defaults to "./prompts".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str = std::env::var("TUTOR_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.trim().to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            "offline" => Provider::Offline,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "TUTOR_PROVIDER".to_string(),
                    format!("'{provider_str}' is not one of gemini, openai, offline"),
                ));
            }
        };

        let gemini_api_key = optional_var("GEMINI_API_KEY");
        let openai_api_key = optional_var("OPENAI_API_KEY");

        let sample_rate: u32 = parsed_var("AUDIO_SAMPLE_RATE", DEFAULT_SPEECH_SAMPLE_RATE)?;
        if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
            return Err(ConfigError::InvalidValue(
                "AUDIO_SAMPLE_RATE".to_string(),
                format!(
                    "{sample_rate} is outside {}..={} Hz",
                    SAMPLE_RATE_RANGE.start(),
                    SAMPLE_RATE_RANGE.end()
                ),
            ));
        }
        let channels: u16 = parsed_var("AUDIO_CHANNELS", 1)?;
        if channels == 0 {
            return Err(ConfigError::InvalidValue(
                "AUDIO_CHANNELS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        match provider {
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                ));
            }
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            provider,
            gemini_api_key,
            openai_api_key,
            chat_model: optional_var("CHAT_MODEL"),
            image_model: optional_var("IMAGE_MODEL"),
            speech_model: optional_var("SPEECH_MODEL"),
            speech_voice: optional_var("SPEECH_VOICE"),
            audio_format: AudioFormat {
                sample_rate,
                channels,
            },
            output_device: optional_var("OUTPUT_DEVICE"),
            prompts_path,
            log_level,
        })
    }
}
