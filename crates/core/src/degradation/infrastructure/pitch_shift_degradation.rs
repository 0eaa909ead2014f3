use ndarray::{s, Array2};

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

use super::time_stretch_degradation::{check_lengthening, stretch_channels};

pub static PITCH_SHIFT_INFO: DegradationInfo = DegradationInfo {
    name: "pitch_shift",
    description: "Apply pitch shifting",
    parameters: &[ParameterInfo {
        name: "pitch_shift_factor",
        example: "0.9",
        description: "Pitch shift factor",
    }],
};

/// Pitch change preserving duration.
///
/// The signal is time-stretched by `1 / factor` and then resampled from
/// `sr * factor` back to `sr`, which scales every frequency by `factor`.
pub struct PitchShift;

impl DegradationKind for PitchShift {
    type Params = f64;

    fn info() -> &'static DegradationInfo {
        &PITCH_SHIFT_INFO
    }

    fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
        let factor = values.parse_positive(&PITCH_SHIFT_INFO, "pitch_shift_factor")?;
        check_lengthening(&PITCH_SHIFT_INFO, "pitch_shift_factor", factor, factor)?;
        Ok(factor)
    }

    fn process(
        factor: &f64,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let n_semitones = semitones(*factor);
        log::info!("Shifting pitch with factor {factor}, i.e. {n_semitones:.3} semitones");

        let rate = audio.sample_rate();
        let frames = audio.frames();
        let source_rate = (rate as f64 * factor).round();
        if source_rate < 1.0 || source_rate > u32::MAX as f64 {
            return Err(DegradationError::invalid_parameter(
                PITCH_SHIFT_INFO.name,
                "pitch_shift_factor",
                factor.to_string(),
                format!("gives an unusable intermediate rate of {source_rate} Hz"),
            ));
        }

        let stretched = stretch_channels(audio.samples(), 1.0 / factor);
        let shifted = env
            .resampler
            .resample(&stretched, source_rate as u32, rate)?;
        audio.set_samples(fix_length(shifted, frames))?;
        Ok(())
    }
}

pub fn semitones(factor: f64) -> f64 {
    12.0 * factor.log2()
}

/// Zero-pad or truncate every row to `frames`.
fn fix_length(samples: Array2<f32>, frames: usize) -> Array2<f32> {
    if samples.ncols() == frames {
        return samples;
    }
    let mut out = Array2::zeros((samples.nrows(), frames));
    let keep = frames.min(samples.ncols());
    out.slice_mut(s![.., ..keep])
        .assign(&samples.slice(s![.., ..keep]));
    out
}
