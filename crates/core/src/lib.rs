//! Lumina Tutor Core
//!
//! The chat session state machine and multi-modal response pipeline: the
//! conversation store, the provider capability boundary, PCM decoding and the
//! `TutorSession` orchestrator that ties them together.

pub mod audio;
pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod store;
pub mod subject;

pub use audio::{AudioFormat, AudioPlayer, PlayableAudioBuffer, SilentPlayer};
pub use error::{DecodeError, PlaybackError, ProviderError, TutorError};
pub use message::{HistoryTurn, Message, MessageKind, Role};
pub use provider::{ImageRef, ProviderClient};
pub use session::{Outcome, TutorSession};
pub use store::{ConversationStore, Status};
pub use subject::{Difficulty, SessionConfig, Subject};
