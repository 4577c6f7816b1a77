//! A credential-free provider for local development and demos.
//!
//! Replies are canned, images are never produced, and speech is a short tone
//! in the configured PCM format, so the whole pipeline can be exercised
//! without network access.

use super::{ImageRef, ProviderClient};
use crate::{
    audio::AudioFormat,
    error::ProviderError,
    message::HistoryTurn,
    subject::{Difficulty, Subject},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::f32::consts::TAU;

const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.2;
const TONE_MILLIS: u64 = 400;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider {
    format: AudioFormat,
}

impl OfflineProvider {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }

    fn tone(&self) -> Bytes {
        let frames = (u64::from(self.format.sample_rate) * TONE_MILLIS / 1000) as usize;
        let mut pcm = Vec::with_capacity(frames * self.format.channels as usize * 2);
        for n in 0..frames {
            let t = n as f32 / self.format.sample_rate as f32;
            let sample = ((TAU * TONE_HZ * t).sin() * TONE_AMPLITUDE * i16::MAX as f32) as i16;
            for _ in 0..self.format.channels {
                pcm.extend_from_slice(&sample.to_le_bytes());
            }
        }
        Bytes::from(pcm)
    }
}

#[async_trait]
impl ProviderClient for OfflineProvider {
    async fn complete_text(
        &self,
        prompt: &str,
        subject: Subject,
        difficulty: Difficulty,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        Ok(format!(
            "## {subject} ({difficulty})\n\
             You asked: \"{}\"\n\
             - I'm running offline, so this is a placeholder explanation.\n\
             - We have exchanged {} message(s) so far.",
            prompt.trim(),
            history.len()
        ))
    }

    async fn generate_image(&self, _prompt_seed: &str) -> Result<Option<ImageRef>, ProviderError> {
        Ok(None)
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<Option<Bytes>, ProviderError> {
        Ok(Some(self.tone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio;

    #[tokio::test]
    async fn test_reply_mentions_config_and_history() {
        let provider = OfflineProvider::default();
        let history = vec![HistoryTurn {
            role: crate::message::Role::User,
            content: "Earlier question".to_string(),
        }];
        let reply = provider
            .complete_text("What is a prime?", Subject::Mathematics, Difficulty::Beginner, &history)
            .await
            .unwrap();

        assert!(reply.starts_with("## Mathematics (Beginner)"));
        assert!(reply.contains("What is a prime?"));
        assert!(reply.contains("1 message(s)"));
    }

    #[tokio::test]
    async fn test_tone_decodes_in_configured_format() {
        let format = AudioFormat {
            sample_rate: 16000,
            channels: 2,
        };
        let provider = OfflineProvider::new(format);
        let payload = provider.synthesize_speech("hi").await.unwrap().unwrap();

        let buffer = audio::decode(&payload, format).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 6400);
        assert_eq!(buffer.channel(0), buffer.channel(1));
    }

    #[tokio::test]
    async fn test_tone_length_at_very_high_sample_rate() {
        let format = AudioFormat {
            sample_rate: 11_000_000,
            channels: 1,
        };
        let payload = OfflineProvider::new(format)
            .synthesize_speech("hi")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(payload.len(), 4_400_000 * 2);
    }

    #[tokio::test]
    async fn test_no_images_offline() {
        let provider = OfflineProvider::default();
        assert!(provider.generate_image("Recursion").await.unwrap().is_none());
    }
}
