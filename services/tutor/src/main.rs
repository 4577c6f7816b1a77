//! Lumina: a multi-modal tutoring chat in the terminal.
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Building the selected provider and the audio output.
//! 4. Running the interactive prompt over a `TutorSession`.

mod config;
mod render;
mod repl;

use crate::config::{Config, Provider};
use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use clap::Parser;
use lumina_core::provider::{
    GeminiClient, OfflineProvider, OpenAIClient, gemini::GeminiModels, openai::OpenAIModels,
};
use lumina_core::{
    AudioFormat, AudioPlayer, Difficulty, ProviderClient, SessionConfig, SilentPlayer, Subject,
    TutorSession, prompt::PromptSet,
};
use lumina_native_utils::CpalPlayer;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Ask questions, see diagrams and hear explanations from an AI tutor")]
struct Cli {
    /// The subject to study
    #[arg(long, default_value_t = Subject::Coding)]
    subject: Subject,
    /// Your current level
    #[arg(long, default_value_t = Difficulty::Intermediate)]
    difficulty: Difficulty,
    /// Synthesize speech without playing it
    #[arg(long)]
    mute: bool,
    /// Print the available audio output devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if args.list_devices {
        let devices = lumina_native_utils::device::get_available_outputs()
            .context("Failed to list audio output devices")?;
        println!("{devices}");
        return Ok(());
    }

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    info!("Configuration loaded successfully. Starting Lumina...");

    // --- 3. Load Prompts ---
    let prompts = PromptSet::from_dir(&config.prompts_path).context("Failed to load prompts")?;

    // --- 4. Initialize Provider and Audio Output ---
    let provider = build_provider(&config, prompts)?;
    let player: Arc<dyn AudioPlayer> = if args.mute {
        Arc::new(SilentPlayer)
    } else {
        Arc::new(CpalPlayer::new(config.output_device.clone()))
    };

    // --- 5. Run the Session ---
    let session = TutorSession::new(
        SessionConfig::new(args.subject, args.difficulty),
        provider,
        player,
    )
    .with_audio_format(config.audio_format);

    repl::run(session).await
}

fn build_provider(config: &Config, prompts: PromptSet) -> Result<Arc<dyn ProviderClient>> {
    match config.provider {
        Provider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .context("GEMINI_API_KEY is required for the gemini provider")?;
            let defaults = GeminiModels::default();
            let models = GeminiModels {
                chat: config.chat_model.clone().unwrap_or(defaults.chat),
                image: config.image_model.clone().unwrap_or(defaults.image),
                speech: config.speech_model.clone().unwrap_or(defaults.speech),
            };
            let mut client = GeminiClient::new(api_key)
                .with_models(models)
                .with_prompts(prompts);
            if let Some(voice) = &config.speech_voice {
                client = client.with_voice(voice.clone());
            }
            info!("Using Gemini provider");
            Ok(Arc::new(client))
        }
        Provider::OpenAI => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is required for the openai provider")?;
            if config.audio_format != AudioFormat::default() {
                warn!(
                    audio_format = ?config.audio_format,
                    "OpenAI speech is 24000 Hz mono, the configured audio format will distort it"
                );
            }
            let defaults = OpenAIModels::default();
            let models = OpenAIModels {
                chat: config.chat_model.clone().unwrap_or(defaults.chat),
                image: config.image_model.clone().unwrap_or(defaults.image),
                speech: config.speech_model.clone().unwrap_or(defaults.speech),
            };
            let mut client = OpenAIClient::new(OpenAIConfig::new().with_api_key(api_key))
                .with_models(models)
                .with_prompts(prompts);
            if let Some(voice) = &config.speech_voice {
                client = client.with_voice(voice);
            }
            info!("Using OpenAI provider");
            Ok(Arc::new(client))
        }
        Provider::Offline => {
            info!("Using offline provider");
            Ok(Arc::new(OfflineProvider::new(config.audio_format)))
        }
    }
}
