use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("expected {expected} channels, got {actual}")]
    ChannelCount { expected: usize, actual: usize },
    #[error("channel lengths differ: {left} vs {right} frames")]
    ChannelLengthMismatch { left: usize, right: usize },
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
    #[error("no audio stream in {0}")]
    NoAudioStream(PathBuf),
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("resampling from {from} Hz to {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },
    #[error("ffmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
