use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{DegradationInfo, DegradationKind, ParameterValues};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels;

pub static NORMALIZATION_INFO: DegradationInfo = DegradationInfo {
    name: "normalization",
    description: "Normalize amplitude of audio to range [-1.0, 1.0]",
    parameters: &[],
};

pub struct Normalization;

impl DegradationKind for Normalization {
    type Params = ();

    fn info() -> &'static DegradationInfo {
        &NORMALIZATION_INFO
    }

    fn parse(_values: &ParameterValues) -> Result<(), DegradationError> {
        Ok(())
    }

    fn process(
        _params: &(),
        audio: &mut AudioBuffer,
        _env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        kernels::normalize(audio)
    }
}
