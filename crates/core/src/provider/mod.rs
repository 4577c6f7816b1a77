//! Provider Capability Boundary
//!
//! The remote model is a black box with three independent, independently
//! failable requests. `TutorSession` depends only on the `ProviderClient`
//! trait, so it can be driven by the Gemini or OpenAI adapters, the offline
//! provider, or a test double.

pub mod gemini;
pub mod offline;
pub mod openai;

use crate::{
    error::ProviderError,
    message::HistoryTurn,
    subject::{Difficulty, Subject},
};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use std::fmt;

pub use gemini::GeminiClient;
pub use offline::OfflineProvider;
pub use openai::OpenAIClient;

/// An opaque reference to a generated image the front-end can display
/// directly: a `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self(format!("data:{mime_type};base64,{data}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Defines the contract the tutoring core needs from a generative-AI service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Answers `prompt` in character as a tutor for `subject` at `difficulty`,
    /// with `history` as prior conversation context.
    async fn complete_text(
        &self,
        prompt: &str,
        subject: Subject,
        difficulty: Difficulty,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError>;

    /// Generates an illustration for a short concept excerpt.
    async fn generate_image(&self, prompt_seed: &str) -> Result<Option<ImageRef>, ProviderError>;

    /// Synthesizes speech as raw PCM16 LE samples.
    async fn synthesize_speech(&self, text: &str) -> Result<Option<Bytes>, ProviderError>;
}

/// Decodes a base64 field of a provider response.
pub(crate) fn decode_base64(data: &str) -> Result<Vec<u8>, ProviderError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| ProviderError::Malformed(format!("invalid base64 payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_from_base64() {
        let image = ImageRef::from_base64("image/png", "iVBORw0KGgo=");
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(image.to_string(), image.clone().into_string());
    }

    #[test]
    fn test_decode_base64() {
        assert_eq!(decode_base64("AAD/fw==").unwrap(), vec![0x00, 0x00, 0xFF, 0x7F]);
        assert!(matches!(
            decode_base64("invalid_base64!"),
            Err(ProviderError::Malformed(_))
        ));
    }
}
