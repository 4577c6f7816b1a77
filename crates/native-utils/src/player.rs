//! `AudioPlayer` backed by a cpal output stream.
//!
//! cpal streams are not `Send`, so each playback runs on a blocking thread:
//! the decoded speech is resampled to the device rate, laid out for the
//! device's channels and queued in a ring buffer that the output callback
//! drains. `play` resolves once the callback has handed out the last sample.

use crate::{audio, device};
use async_trait::async_trait;
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, StreamTrait};
use lumina_core::{AudioPlayer, PlayableAudioBuffer, PlaybackError};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info};

/// Extra time allowed past the buffer's duration before playback is
/// considered stuck.
const PLAYBACK_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct CpalPlayer {
    device_name: Option<String>,
}

impl CpalPlayer {
    /// Plays on the output device named `device_name`, or the default one.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl AudioPlayer for CpalPlayer {
    async fn play(&self, buffer: PlayableAudioBuffer) -> Result<(), PlaybackError> {
        if buffer.is_empty() {
            debug!("Empty buffer, nothing to play");
            return Ok(());
        }
        let device_name = self.device_name.clone();
        tokio::task::spawn_blocking(move || play_blocking(device_name.as_deref(), &buffer))
            .await
            .map_err(|e| PlaybackError::Stream(e.into()))?
    }
}

fn play_blocking(
    device_name: Option<&str>,
    buffer: &PlayableAudioBuffer,
) -> Result<(), PlaybackError> {
    let output = device::get_or_default_output(device_name)
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
    let output_config = output
        .default_output_config()
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    debug!("Output stream config: {:?}", &output_config);

    let output_channel_count = output_config.channels as usize;
    let resampled = audio::resample(buffer, output_config.sample_rate.0)?;
    let samples = audio::interleave(&resampled, output_channel_count);
    if samples.is_empty() {
        return Ok(());
    }

    let (mut audio_out_tx, mut audio_out_rx) = audio::shared_buffer(samples.len()).split();
    let queued = audio_out_tx.push_slice(&samples);
    debug!(queued, total = samples.len(), "Queued samples for playback");

    let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let popped = audio_out_rx.pop_slice(data);
        data[popped..].fill(0.0);
        // The previous callback handed out the last samples.
        if popped == 0 && audio_out_rx.is_empty() {
            let _ = done_tx.try_send(());
        }
    };

    let output_stream = output
        .build_output_stream(
            &output_config,
            output_data_fn,
            move |err| tracing::error!("An error occurred on output stream: {}", err),
            None,
        )
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
    output_stream
        .play()
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
    info!(
        duration_ms = buffer.duration().as_millis() as u64,
        "Playback started"
    );

    done_rx
        .recv_timeout(buffer.duration() + PLAYBACK_GRACE)
        .map_err(|e| PlaybackError::Device(format!("playback did not complete: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_buffer_never_opens_a_device() {
        let player = CpalPlayer::new(Some("no such device".to_string()));
        let buffer = PlayableAudioBuffer::new(24000, vec![Vec::new()]);
        assert!(player.play(buffer).await.is_ok());
    }
}
