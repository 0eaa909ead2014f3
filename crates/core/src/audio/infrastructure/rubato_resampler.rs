use ndarray::Array2;
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::resampler::{resampled_len, Resampler};

const CHUNK_SIZE: usize = 1024;

/// Whole-buffer windowed-sinc resampling with rubato.
///
/// The output is time-aligned with the input and cut to exactly
/// `round(frames * to / from)` frames, so repeated conversions do not drift
/// in length or position.
pub struct RubatoResampler {
    sinc_len: usize,
    oversampling_factor: usize,
}

impl RubatoResampler {
    pub fn new() -> Self {
        Self {
            sinc_len: 256,
            oversampling_factor: 256,
        }
    }
}

impl Default for RubatoResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for RubatoResampler {
    fn resample(
        &self,
        samples: &Array2<f32>,
        from_rate: u32,
        to_rate: u32,
    ) -> Result<Array2<f32>, AudioError> {
        if from_rate == 0 {
            return Err(AudioError::InvalidSampleRate(from_rate));
        }
        if to_rate == 0 {
            return Err(AudioError::InvalidSampleRate(to_rate));
        }
        let frames = samples.ncols();
        if from_rate == to_rate {
            return Ok(samples.clone());
        }
        if frames == 0 {
            return Ok(Array2::zeros((samples.nrows(), 0)));
        }

        let fail = |reason: String| AudioError::Resample {
            from: from_rate,
            to: to_rate,
            reason,
        };

        let channels = samples.nrows();
        let ratio = to_rate as f64 / from_rate as f64;
        let params = SincInterpolationParameters {
            sinc_len: self.sinc_len,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: self.oversampling_factor,
            window: WindowFunction::BlackmanHarris2,
        };
        let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, CHUNK_SIZE, channels)
            .map_err(|e| fail(e.to_string()))?;

        let input: Vec<Vec<f64>> = samples
            .outer_iter()
            .map(|row| row.iter().map(|&x| x as f64).collect())
            .collect();
        let target = resampled_len(frames, from_rate, to_rate);
        let mut output: Vec<Vec<f64>> = vec![Vec::with_capacity(target); channels];

        let mut pos = 0;
        while frames - pos >= resampler.input_frames_next() {
            let needed = resampler.input_frames_next();
            let chunk: Vec<&[f64]> = input.iter().map(|c| &c[pos..pos + needed]).collect();
            let out = resampler
                .process(&chunk, None)
                .map_err(|e| fail(e.to_string()))?;
            append(&mut output, out);
            pos += needed;
        }
        if pos < frames {
            let chunk: Vec<&[f64]> = input.iter().map(|c| &c[pos..]).collect();
            let out = resampler
                .process_partial(Some(&chunk), None)
                .map_err(|e| fail(e.to_string()))?;
            append(&mut output, out);
        }
        // Flush the filter tail until the output covers the target.
        while output[0].len() < target {
            let out = resampler
                .process_partial::<Vec<f64>>(None, None)
                .map_err(|e| fail(e.to_string()))?;
            if out[0].is_empty() {
                break;
            }
            append(&mut output, out);
        }

        let mut result = Array2::<f32>::zeros((channels, target));
        for (ch, data) in output.iter().enumerate() {
            for (i, &v) in data.iter().take(target).enumerate() {
                result[[ch, i]] = v as f32;
            }
        }
        Ok(result)
    }
}

fn append(output: &mut [Vec<f64>], chunk: Vec<Vec<f64>>) {
    for (dst, src) in output.iter_mut().zip(chunk) {
        dst.extend(src);
    }
}
