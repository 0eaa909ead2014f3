use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels;

pub static GAIN_INFO: DegradationInfo = DegradationInfo {
    name: "gain",
    description: "Apply gain expressed in dBs",
    parameters: &[ParameterInfo {
        name: "value",
        example: "6",
        description: "Gain value [dB]",
    }],
};

/// Gain in dB, clipped to [-1, 1].
pub struct Gain;

impl DegradationKind for Gain {
    type Params = f64;

    fn info() -> &'static DegradationInfo {
        &GAIN_INFO
    }

    fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
        values.parse_f64(&GAIN_INFO, "value")
    }

    fn process(
        value: &f64,
        audio: &mut AudioBuffer,
        _env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        log::debug!("Apply gain {value} dB");
        kernels::apply_gain(audio, *value);
        Ok(())
    }
}
