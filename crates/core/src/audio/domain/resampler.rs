use ndarray::Array2;

use super::audio_error::AudioError;

/// Domain interface for sample-rate conversion of planar audio.
pub trait Resampler: Send {
    /// Convert every row of `samples` from `from_rate` to `to_rate`.
    ///
    /// The output has `round(frames * to_rate / from_rate)` frames.
    fn resample(
        &self,
        samples: &Array2<f32>,
        from_rate: u32,
        to_rate: u32,
    ) -> Result<Array2<f32>, AudioError>;
}

/// Expected output length of a resampling from `from_rate` to `to_rate`.
pub fn resampled_len(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    (frames as f64 * to_rate as f64 / from_rate as f64).round() as usize
}
