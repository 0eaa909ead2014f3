use ndarray::Array2;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

use super::phase_vocoder;

pub static TIME_STRETCH_INFO: DegradationInfo = DegradationInfo {
    name: "time_stretch",
    description: "Apply time stretching",
    parameters: &[ParameterInfo {
        name: "time_stretch_factor",
        example: "0.9",
        description: "Time stretch factor",
    }],
};

/// Largest lengthening the phase vocoder is asked for, as a multiple of the
/// input length.
pub(crate) const MAX_LENGTHENING: f64 = 100.0;

/// Tempo change without pitch change. A factor above 1 shortens the audio.
pub struct TimeStretch;

impl DegradationKind for TimeStretch {
    type Params = f64;

    fn info() -> &'static DegradationInfo {
        &TIME_STRETCH_INFO
    }

    fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
        let factor = values.parse_positive(&TIME_STRETCH_INFO, "time_stretch_factor")?;
        check_lengthening(&TIME_STRETCH_INFO, "time_stretch_factor", factor, 1.0 / factor)?;
        Ok(factor)
    }

    fn process(
        factor: &f64,
        audio: &mut AudioBuffer,
        _env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        log::info!("Time stretching with factor {factor}");
        audio.set_samples(stretch_channels(audio.samples(), *factor))?;
        Ok(())
    }
}

/// Reject parameters that would make the output more than
/// [`MAX_LENGTHENING`] times longer than the input.
pub(crate) fn check_lengthening(
    info: &DegradationInfo,
    parameter: &str,
    value: f64,
    lengthening: f64,
) -> Result<(), DegradationError> {
    if !lengthening.is_finite() || lengthening > MAX_LENGTHENING {
        return Err(DegradationError::invalid_parameter(
            info.name,
            parameter,
            value.to_string(),
            format!("would stretch the audio more than {MAX_LENGTHENING}x"),
        ));
    }
    Ok(())
}

/// Time-stretch every channel independently.
pub(crate) fn stretch_channels(samples: &Array2<f32>, rate: f64) -> Array2<f32> {
    let target = (samples.ncols() as f64 / rate).round() as usize;
    let mut stretched = Array2::zeros((samples.nrows(), target));
    for (src, mut dst) in samples.outer_iter().zip(stretched.outer_iter_mut()) {
        dst.assign(&phase_vocoder::time_stretch(src, rate));
    }
    stretched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradation::domain::degradation_env::tests::stub_env;
    use rstest::rstest;

    #[rstest]
    #[case::faster(1.25, 6400)]
    #[case::slower(0.9, 8889)]
    fn test_length_follows_tempo_factor(#[case] factor: f64, #[case] frames: usize) {
        let (env, _tmp) = stub_env();
        let ch: Vec<f32> = (0..8000).map(|i| (i as f32 * 0.07).sin() * 0.4).collect();
        let mut audio = AudioBuffer::from_channels(vec![ch], 8000).unwrap();
        TimeStretch::process(&factor, &mut audio, &env).unwrap();
        assert_eq!(audio.frames(), frames);
        assert_eq!(audio.sample_rate(), 8000);
    }

    #[rstest]
    #[case::tiny("1e-7")]
    #[case::just_below_bound("0.0099")]
    fn test_extreme_slowdown_rejected(#[case] raw: &str) {
        let values = [("time_stretch_factor", raw)].into_iter().collect();
        assert!(matches!(
            TimeStretch::parse(&values),
            Err(DegradationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_slowdown_at_bound_accepted() {
        let values = [("time_stretch_factor", "0.01")].into_iter().collect();
        assert_eq!(TimeStretch::parse(&values).unwrap(), 0.01);
    }

    #[test]
    fn test_zero_factor_rejected() {
        let values = [("time_stretch_factor", "0")].into_iter().collect();
        assert!(TimeStretch::parse(&values).is_err());
    }
}
