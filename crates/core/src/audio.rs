//! PCM16 decoding and the playback boundary.

use crate::error::{DecodeError, PlaybackError};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;

/// Sample rate the speech providers in this deployment emit.
pub const DEFAULT_SPEECH_SAMPLE_RATE: u32 = 24000;

/// Layout of a raw speech payload: 16-bit signed little-endian samples,
/// interleaved by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SPEECH_SAMPLE_RATE,
            channels: 1,
        }
    }
}

/// Decoded audio, one normalized sample stream per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PlayableAudioBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Interprets `raw` as interleaved PCM16 LE and de-interleaves it.
///
/// Each sample is divided by 32768.0, so the range is [-1.0, 1.0).
pub fn decode(raw: &[u8], format: AudioFormat) -> Result<PlayableAudioBuffer, DecodeError> {
    if format.channels == 0 {
        return Err(DecodeError::NoChannels);
    }
    let channel_count = format.channels as usize;
    let frame_bytes = 2 * channel_count;
    if raw.len() % frame_bytes != 0 {
        return Err(DecodeError::PartialFrame {
            len: raw.len(),
            channels: format.channels,
            frame_bytes,
        });
    }

    let frames = raw.len() / frame_bytes;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for (i, chunk) in raw.chunks_exact(2).enumerate() {
        let v = i16::from_le_bytes([chunk[0], chunk[1]]);
        channels[i % channel_count].push(v as f32 / 32768.0);
    }

    Ok(PlayableAudioBuffer::new(format.sample_rate, channels))
}

/// Hands decoded audio to an output and resolves once playback has finished.
///
/// Playback cannot be cancelled; callers keep a single playback in flight.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, buffer: PlayableAudioBuffer) -> Result<(), PlaybackError>;
}

/// Plays nothing, but takes as long as the audio would.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

#[async_trait]
impl AudioPlayer for SilentPlayer {
    async fn play(&self, buffer: PlayableAudioBuffer) -> Result<(), PlaybackError> {
        tracing::debug!(frames = buffer.frames(), "Silent playback");
        tokio::time::sleep(buffer.duration()).await;
        Ok(())
    }
}
