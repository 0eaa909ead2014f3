use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

pub static SPEED_INFO: DegradationInfo = DegradationInfo {
    name: "speed",
    description: "Change playback speed",
    parameters: &[ParameterInfo {
        name: "speed",
        example: "0.9",
        description: "Playback speed factor",
    }],
};

/// Playback speed change: samples are resampled to `floor(sr / speed)` and
/// then reinterpreted at the original rate, so pitch moves with tempo.
pub struct Speed;

impl DegradationKind for Speed {
    type Params = f64;

    fn info() -> &'static DegradationInfo {
        &SPEED_INFO
    }

    fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
        values.parse_positive(&SPEED_INFO, "speed")
    }

    fn process(
        speed: &f64,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let rate = audio.sample_rate();
        let target = (rate as f64 / speed).floor();
        if target < 1.0 || target > u32::MAX as f64 {
            return Err(DegradationError::invalid_parameter(
                SPEED_INFO.name,
                "speed",
                speed.to_string(),
                format!("gives an unusable intermediate rate of {target} Hz"),
            ));
        }
        log::info!("Modifying speed with factor {speed}");
        let resampled = env.resampler.resample(audio.samples(), rate, target as u32)?;
        audio.set_samples(resampled)?;
        Ok(())
    }
}
