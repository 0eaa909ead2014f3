use std::path::Path;

use super::audio_buffer::AudioBuffer;
use super::audio_error::AudioError;

/// Domain interface for decoding an audio file into a stereo buffer.
pub trait AudioReader: Send {
    /// Decode the file at its native sample rate. Mono sources come back
    /// with both channels identical.
    fn load(&self, path: &Path) -> Result<AudioBuffer, AudioError>;
}
