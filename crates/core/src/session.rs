//! Tutor Session Orchestrator
//!
//! Turns the three user-triggered actions (ask, visualize, speak) into
//! provider calls and folds the results back into the conversation store.
//!
//! The store lives inside a `watch` channel: every transition is a single
//! closure run under the channel's lock, so a guard check, its flag change and
//! any append are observed together, and front-ends re-render from their
//! receiver. No lock is held across a provider call or playback.

use crate::{
    audio::{self, AudioFormat, AudioPlayer},
    error::TutorError,
    message::{MessageKind, Role},
    provider::ProviderClient,
    store::{ConversationStore, Status},
    subject::SessionConfig,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Appended in place of an empty text completion.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response. Let's try again.";
/// Length of the excerpt used to seed image generation.
pub const EXCERPT_CHARS: usize = 30;
/// Longest text sent for speech synthesis.
pub const SPEECH_CHARS: usize = 500;

/// What a session operation did, for front-end feedback only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped by a reentrancy guard or empty input; nothing changed.
    Skipped,
    /// A message was added to the timeline.
    Appended,
    /// The provider failed or returned nothing; the timeline is unchanged.
    NoResult,
    /// Speech was synthesized and played to completion.
    Played,
}

/// One tutoring session: a fixed configuration and its timeline.
pub struct TutorSession {
    config: SessionConfig,
    provider: Arc<dyn ProviderClient>,
    player: Arc<dyn AudioPlayer>,
    audio_format: AudioFormat,
    store: watch::Sender<ConversationStore>,
}

impl TutorSession {
    pub fn new(
        config: SessionConfig,
        provider: Arc<dyn ProviderClient>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        let (store, _) = watch::channel(ConversationStore::new());
        Self {
            config,
            provider,
            player,
            audio_format: AudioFormat::default(),
            store,
        }
    }

    /// Sets the PCM layout the provider's speech payloads use.
    pub fn with_audio_format(mut self, format: AudioFormat) -> Self {
        self.audio_format = format;
        self
    }

    /// Ends this session and starts another with an empty timeline, sharing
    /// the provider, player and audio format.
    pub fn start_new(&self, config: SessionConfig) -> Self {
        Self::new(config, self.provider.clone(), self.player.clone())
            .with_audio_format(self.audio_format)
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// A receiver that is notified after every store transition.
    pub fn subscribe(&self) -> watch::Receiver<ConversationStore> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> ConversationStore {
        self.store.borrow().clone()
    }

    /// Sends `text` to the tutor and appends the reply.
    ///
    /// Ignored when `text` is blank or another request is already awaiting a
    /// response. A provider failure leaves only the user's message behind.
    #[instrument(name = "ask", skip_all, fields(session = %self.config))]
    pub async fn ask(&self, text: &str) -> Outcome {
        if text.trim().is_empty() {
            debug!("Ignoring blank question");
            return Outcome::Skipped;
        }

        let mut history = None;
        self.store.send_if_modified(|store| {
            if store.is_awaiting_response() {
                return false;
            }
            history = Some(store.history());
            store.append(Role::User, MessageKind::Text, text.to_string());
            store.set_awaiting_response(Status::Pending);
            true
        });
        let Some(history) = history else {
            warn!("A response is already pending, dropping question");
            return Outcome::Skipped;
        };

        info!(history_turns = history.len(), "Asking tutor");
        let reply = match self
            .provider
            .complete_text(text, self.config.subject, self.config.difficulty, &history)
            .await
        {
            Ok(reply) if reply.is_empty() => {
                warn!(error = %TutorError::EmptyResult("reply"), "Using fallback reply");
                Some(FALLBACK_REPLY.to_string())
            }
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(error = %TutorError::from(e), "Text completion failed");
                None
            }
        };

        let outcome = if reply.is_some() {
            Outcome::Appended
        } else {
            Outcome::NoResult
        };
        self.store.send_modify(|store| {
            if let Some(content) = reply {
                store.append(Role::Assistant, MessageKind::Text, content);
            }
            store.set_awaiting_response(Status::Idle);
        });
        outcome
    }

    /// Requests an illustration seeded by the first characters of `source`.
    ///
    /// Shares the loading guard with `ask`; the guard is released whatever
    /// the provider does.
    #[instrument(name = "visualize", skip_all, fields(session = %self.config))]
    pub async fn visualize(&self, source: &str) -> Outcome {
        let excerpt = truncate_chars(source, EXCERPT_CHARS);
        let started = self.store.send_if_modified(|store| {
            if store.is_awaiting_response() {
                return false;
            }
            store.set_awaiting_response(Status::Pending);
            true
        });
        if !started {
            warn!("A response is already pending, dropping visual request");
            return Outcome::Skipped;
        }

        info!(%excerpt, "Generating visual aid");
        let image = match self.provider.generate_image(excerpt).await {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                warn!(error = %TutorError::EmptyResult("image"), "No visual aid produced");
                None
            }
            Err(e) => {
                error!(error = %TutorError::from(e), "Image generation failed");
                None
            }
        };

        let outcome = if image.is_some() {
            Outcome::Appended
        } else {
            Outcome::NoResult
        };
        self.store.send_modify(|store| {
            if let Some(image) = image {
                store.append(Role::Assistant, MessageKind::Image, image.into_string());
            }
            store.set_awaiting_response(Status::Idle);
        });
        outcome
    }

    /// Reads `text` aloud. A no-op while another playback is in progress.
    ///
    /// The speaking flag is released only after playback has finished, or
    /// straight away when there is nothing to play.
    #[instrument(name = "speak", skip_all, fields(session = %self.config))]
    pub async fn speak(&self, text: &str) -> Outcome {
        let started = self.store.send_if_modified(|store| {
            if store.is_speaking() {
                return false;
            }
            store.set_speaking(Status::Pending);
            true
        });
        if !started {
            debug!("Already speaking, ignoring request");
            return Outcome::Skipped;
        }

        let outcome = match self.play_speech(truncate_chars(text, SPEECH_CHARS)).await {
            Ok(()) => Outcome::Played,
            Err(e @ TutorError::EmptyResult(_)) => {
                warn!(error = %e, "Nothing to play");
                Outcome::NoResult
            }
            Err(e) => {
                error!(error = %e, "Speech playback failed");
                Outcome::NoResult
            }
        };
        self.store.send_modify(|store| store.set_speaking(Status::Idle));
        outcome
    }

    async fn play_speech(&self, text: &str) -> Result<(), TutorError> {
        let payload = self
            .provider
            .synthesize_speech(text)
            .await?
            .ok_or(TutorError::EmptyResult("speech"))?;
        let buffer = audio::decode(&payload, self.audio_format)?;
        info!(frames = buffer.frames(), "Playing speech");
        self.player.play(buffer).await?;
        Ok(())
    }
}

/// The first `max` characters of `text`, never splitting a character.
fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices()
        .nth(max)
        .map_or(text, |(index, _)| &text[..index])
}
