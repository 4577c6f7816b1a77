//! Error types for the tutoring pipeline.
//!
//! None of these ever reach the front-end: `TutorSession` catches them at the
//! operation boundary, logs them and degrades to "no result".

/// Any failure from a remote text, image or speech request.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Malformed provider response: {0}")]
    Malformed(String),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("OpenAI client error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),
}

/// The speech payload is not a whole number of PCM16 frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Channel count must be at least 1")]
    NoChannels,
    #[error("Payload of {len} bytes is not a multiple of {frame_bytes} ({channels} channel(s) of 16-bit samples)")]
    PartialFrame {
        len: usize,
        channels: u16,
        frame_bytes: usize,
    },
}

/// A playback attempt that could not run to completion.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Audio output device unavailable: {0}")]
    Device(String),
    #[error("Audio stream failed: {0}")]
    Stream(#[from] anyhow::Error),
}

/// Everything a session operation can run into.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("Provider returned no usable {0}")]
    EmptyResult(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Http {
            status: 429,
            message: "Resource exhausted".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned HTTP 429: Resource exhausted");

        let err = DecodeError::PartialFrame {
            len: 3,
            channels: 1,
            frame_bytes: 2,
        };
        assert_eq!(
            err.to_string(),
            "Payload of 3 bytes is not a multiple of 2 (1 channel(s) of 16-bit samples)"
        );

        let err = TutorError::EmptyResult("image");
        assert_eq!(err.to_string(), "Provider returned no usable image");
    }

    #[test]
    fn test_decode_error_converts_through_playback() {
        let err: PlaybackError = DecodeError::NoChannels.into();
        let err: TutorError = err.into();
        assert!(matches!(
            err,
            TutorError::Playback(PlaybackError::Decode(DecodeError::NoChannels))
        ));
    }
}
