use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

pub static RESAMPLE_INFO: DegradationInfo = DegradationInfo {
    name: "resample",
    description: "Resample to given sample rate",
    parameters: &[ParameterInfo {
        name: "sample_rate",
        example: "8000",
        description: "Desired sample rate [Hz]",
    }],
};

pub struct Resample;

impl DegradationKind for Resample {
    type Params = u32;

    fn info() -> &'static DegradationInfo {
        &RESAMPLE_INFO
    }

    fn parse(values: &ParameterValues) -> Result<u32, DegradationError> {
        let rate: u32 = values.parse(&RESAMPLE_INFO, "sample_rate")?;
        if rate == 0 {
            return Err(DegradationError::invalid_parameter(
                RESAMPLE_INFO.name,
                "sample_rate",
                "0",
                "must be greater than zero",
            ));
        }
        Ok(rate)
    }

    fn process(
        rate: &u32,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let from = audio.sample_rate();
        log::debug!("Resampling from {from} Hz to {rate} Hz");
        let resampled = env.resampler.resample(audio.samples(), from, *rate)?;
        audio.replace(resampled, *rate)?;
        Ok(())
    }
}
