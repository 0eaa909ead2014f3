use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels;

pub static TRIM_INFO: DegradationInfo = DegradationInfo {
    name: "trim_from",
    description: "Trim audio from a given start time",
    parameters: &[ParameterInfo {
        name: "start_time",
        example: "0.1",
        description: "Trim start [seconds]",
    }],
};

pub struct Trim;

impl DegradationKind for Trim {
    type Params = f64;

    fn info() -> &'static DegradationInfo {
        &TRIM_INFO
    }

    fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
        let start = values.parse_f64(&TRIM_INFO, "start_time")?;
        if start < 0.0 {
            return Err(DegradationError::invalid_parameter(
                TRIM_INFO.name,
                "start_time",
                values.get("start_time").unwrap_or_default(),
                "must not be negative",
            ));
        }
        Ok(start)
    }

    fn process(
        start_time: &f64,
        audio: &mut AudioBuffer,
        _env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let dropped = kernels::trim_start(audio, *start_time);
        log::debug!("Trimmed {dropped} frames, {} left", audio.frames());
        Ok(())
    }
}
