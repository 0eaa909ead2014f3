use std::path::Path;

use super::audio_buffer::AudioBuffer;
use super::audio_error::AudioError;

/// Sample encoding requested from the writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Whatever the container's default codec uses (16-bit PCM for wav).
    #[default]
    CodecDefault,
    /// Lossless 32-bit float PCM; values outside [-1, 1] survive.
    Float32,
}

/// Domain interface for encoding a buffer to a file.
pub trait AudioWriter: Send {
    /// Encode the buffer in the format implied by the path's extension,
    /// replacing any existing file.
    fn save(&self, path: &Path, audio: &AudioBuffer) -> Result<(), AudioError> {
        self.save_as(path, audio, SampleEncoding::CodecDefault)
    }

    fn save_as(
        &self,
        path: &Path,
        audio: &AudioBuffer,
        encoding: SampleEncoding,
    ) -> Result<(), AudioError>;
}
