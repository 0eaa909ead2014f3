use ndarray::{s, Array2, ArrayView1, Axis};

use super::audio_error::AudioError;

/// Number of channels every buffer carries. Mono sources are upmixed.
pub const CHANNELS: usize = 2;

/// Planar stereo audio: a `2 x frames` array plus its sample rate.
///
/// Samples are nominally in [-1.0, 1.0] but are not clamped here; only the
/// operations whose contract says so clip.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    samples: Array2<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Array2<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        check_channels(&samples)?;
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Builds a buffer from per-channel vectors. One channel is duplicated
    /// into both outputs.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, AudioError> {
        let (left, right) = match channels.len() {
            1 => {
                let mono = channels.into_iter().next().unwrap_or_default();
                (mono.clone(), mono)
            }
            2 => {
                let mut it = channels.into_iter();
                let left = it.next().unwrap_or_default();
                let right = it.next().unwrap_or_default();
                if left.len() != right.len() {
                    return Err(AudioError::ChannelLengthMismatch {
                        left: left.len(),
                        right: right.len(),
                    });
                }
                (left, right)
            }
            n => {
                return Err(AudioError::ChannelCount {
                    expected: CHANNELS,
                    actual: n,
                })
            }
        };
        let frames = left.len();
        let mut data = left;
        data.extend_from_slice(&right);
        let samples = Array2::from_shape_vec((CHANNELS, frames), data)
            .map_err(|_| AudioError::ChannelLengthMismatch { left: frames, right: frames })?;
        Self::new(samples, sample_rate)
    }

    pub fn silent(frames: usize, sample_rate: u32) -> Result<Self, AudioError> {
        Self::new(Array2::zeros((CHANNELS, frames)), sample_rate)
    }

    pub fn samples(&self) -> &Array2<f32> {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut Array2<f32> {
        &mut self.samples
    }

    /// Replaces the sample data, keeping the sample rate.
    pub fn set_samples(&mut self, samples: Array2<f32>) -> Result<(), AudioError> {
        check_channels(&samples)?;
        self.samples = samples;
        Ok(())
    }

    /// Replaces sample data and sample rate together (resampling).
    pub fn replace(&mut self, samples: Array2<f32>, sample_rate: u32) -> Result<(), AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        self.set_samples(samples)?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel(&self, index: usize) -> ArrayView1<'_, f32> {
        self.samples.row(index)
    }

    pub fn channel_vecs(&self) -> Vec<Vec<f32>> {
        self.samples.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len_of(Axis(1))
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn frame_index_at_time(&self, time: f64) -> usize {
        (time * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Drops the first `frames` frames of both channels. Dropping more than
    /// the buffer holds leaves it empty.
    pub fn drop_leading(&mut self, frames: usize) {
        let start = frames.min(self.frames());
        self.samples = self.samples.slice(s![.., start..]).to_owned();
    }

    /// Root-mean-square over both channels. Zero for an empty buffer.
    pub fn rms(&self) -> f64 {
        let n = self.samples.len();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
        (sum / n as f64).sqrt()
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, x| acc.max(x.abs()))
    }

    pub fn mean(&self) -> f64 {
        let n = self.samples.len();
        if n == 0 {
            return 0.0;
        }
        self.samples.iter().map(|&x| x as f64).sum::<f64>() / n as f64
    }

    /// Hard-clips every sample to [-1.0, 1.0].
    pub fn clip(&mut self) {
        self.samples.mapv_inplace(|x| x.clamp(-1.0, 1.0));
    }
}

fn check_channels(samples: &Array2<f32>) -> Result<(), AudioError> {
    if samples.nrows() != CHANNELS {
        return Err(AudioError::ChannelCount {
            expected: CHANNELS,
            actual: samples.nrows(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_new_rejects_mono_array() {
        let result = AudioBuffer::new(Array2::zeros((1, 10)), 16000);
        assert!(matches!(
            result,
            Err(AudioError::ChannelCount { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_new_rejects_zero_sample_rate() {
        let result = AudioBuffer::new(Array2::zeros((2, 10)), 0);
        assert!(matches!(result, Err(AudioError::InvalidSampleRate(0))));
    }

    #[test]
    fn test_from_channels_upmixes_mono() {
        let buf = AudioBuffer::from_channels(vec![vec![0.1, 0.2, 0.3]], 8000).unwrap();
        assert_eq!(buf.frames(), 3);
        assert_eq!(buf.channel(0), buf.channel(1));
        assert_relative_eq!(buf.channel(1)[2], 0.3);
    }

    #[test]
    fn test_from_channels_keeps_stereo() {
        let buf = AudioBuffer::from_channels(vec![vec![0.1, 0.2], vec![-0.1, -0.2]], 8000).unwrap();
        assert_relative_eq!(buf.channel(0)[1], 0.2);
        assert_relative_eq!(buf.channel(1)[1], -0.2);
    }

    #[test]
    fn test_from_channels_rejects_uneven_lengths() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 4]], 8000);
        assert!(matches!(
            result,
            Err(AudioError::ChannelLengthMismatch { left: 3, right: 4 })
        ));
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer::silent(48000, 16000).unwrap();
        assert_relative_eq!(buf.duration(), 3.0);
    }

    #[test]
    fn test_drop_leading_past_end_empties_buffer() {
        let mut buf = AudioBuffer::silent(100, 16000).unwrap();
        buf.drop_leading(500);
        assert_eq!(buf.frames(), 0);
        assert_eq!(buf.samples().nrows(), 2);
    }

    #[test]
    fn test_rms_peak_mean() {
        let buf = AudioBuffer::new(array![[1.0, -1.0], [1.0, -1.0]], 8000).unwrap();
        assert_relative_eq!(buf.rms(), 1.0);
        assert_relative_eq!(buf.peak(), 1.0);
        assert_relative_eq!(buf.mean(), 0.0);
    }

    #[test]
    fn test_rms_of_empty_buffer_is_zero() {
        let buf = AudioBuffer::silent(0, 8000).unwrap();
        assert_eq!(buf.rms(), 0.0);
    }

    #[test]
    fn test_clip() {
        let mut buf = AudioBuffer::new(array![[1.5, -0.5], [-2.0, 0.25]], 8000).unwrap();
        buf.clip();
        assert_eq!(buf.samples(), &array![[1.0, -0.5], [-1.0, 0.25]]);
    }

    #[test]
    fn test_replace_updates_rate() {
        let mut buf = AudioBuffer::silent(10, 8000).unwrap();
        buf.replace(Array2::zeros((2, 20)), 16000).unwrap();
        assert_eq!(buf.sample_rate(), 16000);
        assert_eq!(buf.frames(), 20);
    }
}
