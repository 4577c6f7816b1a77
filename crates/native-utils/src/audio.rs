use lumina_core::PlayableAudioBuffer;
use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Input frames per resampler pass.
pub const RESAMPLER_CHUNK_SIZE: usize = 1024;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
    channels: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        channels,
    )?;
    Ok(resampler)
}

/// Splits a slice of audio samples into fixed-size chunks.
/// The last chunk is padded with zeros.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Creates a new ring buffer on the heap for shared audio data.
pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Converts every channel of `buffer` to `out_rate`.
///
/// The result has one vector per channel, each trimmed to the frame count the
/// new rate implies.
pub fn resample(buffer: &PlayableAudioBuffer, out_rate: u32) -> anyhow::Result<Vec<Vec<f32>>> {
    if buffer.sample_rate() == out_rate || buffer.is_empty() {
        return Ok(buffer.channels().to_vec());
    }

    let channel_count = buffer.channel_count();
    let mut resampler = create_resampler(
        buffer.sample_rate() as f64,
        out_rate as f64,
        RESAMPLER_CHUNK_SIZE,
        channel_count,
    )?;

    let chunked: Vec<Vec<Vec<f32>>> = buffer
        .channels()
        .iter()
        .map(|channel| split_for_chunks(channel, RESAMPLER_CHUNK_SIZE))
        .collect();
    let chunk_count = chunked.first().map_or(0, Vec::len);
    let expected =
        (buffer.frames() as f64 * out_rate as f64 / buffer.sample_rate() as f64).round() as usize;

    let mut output = vec![Vec::with_capacity(expected); channel_count];
    for index in 0..chunk_count {
        let input: Vec<&[f32]> = chunked
            .iter()
            .map(|chunks| chunks[index].as_slice())
            .collect();
        let resampled = resampler.process(&input[..], None)?;
        for (out, samples) in output.iter_mut().zip(resampled) {
            out.extend(samples);
        }
    }
    for out in &mut output {
        out.truncate(expected);
    }
    Ok(output)
}

/// Lays out per-channel samples frame by frame for a device with
/// `device_channels` outputs.
///
/// A mono source is copied to every output. Otherwise source channel `n`
/// feeds output `n`, surplus sources are dropped and surplus outputs are
/// silent.
pub fn interleave(channels: &[Vec<f32>], device_channels: usize) -> Vec<f32> {
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(frames * device_channels);
    for frame in 0..frames {
        for output in 0..device_channels {
            let sample = match channels.len() {
                1 => channels[0][frame],
                n if output < n => channels[output][frame],
                _ => 0.0,
            };
            interleaved.push(sample);
        }
    }
    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_split_for_chunks_pads_last_chunk() {
        let chunks = split_for_chunks(&[0.1, 0.2, 0.3, 0.4, 0.5], 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], vec![0.5, 0.0]);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let buffer = PlayableAudioBuffer::new(24000, vec![vec![0.25, -0.5, 0.75]]);
        let resampled = resample(&buffer, 24000).unwrap();
        assert_eq!(resampled, vec![vec![0.25, -0.5, 0.75]]);
    }

    #[test]
    fn test_resample_changes_frame_count() {
        let tone: Vec<f32> = (0..2400).map(|n| (n as f32 * 0.05).sin() * 0.5).collect();
        let buffer = PlayableAudioBuffer::new(24000, vec![tone.clone(), tone]);

        let up = resample(&buffer, 48000).unwrap();
        assert_eq!(up.len(), 2);
        assert_eq!(up[0].len(), 4800);
        assert_eq!(up[1].len(), 4800);

        let down = resample(&buffer, 16000).unwrap();
        assert_eq!(down[0].len(), 1600);
        assert!(down[0].iter().all(|sample| sample.abs() <= 1.0));
    }

    #[test]
    fn test_interleave_mono_to_stereo() {
        let interleaved = interleave(&[vec![0.1, 0.2]], 2);
        assert_eq!(interleaved.len(), 4);
        assert_relative_eq!(interleaved[0], 0.1);
        assert_relative_eq!(interleaved[1], 0.1);
        assert_relative_eq!(interleaved[2], 0.2);
        assert_relative_eq!(interleaved[3], 0.2);
    }

    #[test]
    fn test_interleave_stereo_to_surround_and_mono() {
        let source = vec![vec![0.1, 0.2], vec![-0.1, -0.2]];

        let surround = interleave(&source, 3);
        assert_eq!(surround, vec![0.1, -0.1, 0.0, 0.2, -0.2, 0.0]);

        let mono = interleave(&source, 1);
        assert_eq!(mono, vec![0.1, 0.2]);
    }

    #[test]
    fn test_interleave_empty() {
        assert!(interleave(&[], 2).is_empty());
    }
}
