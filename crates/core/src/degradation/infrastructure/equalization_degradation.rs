use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels::{self, Biquad};

pub static EQUALIZATION_INFO: DegradationInfo = DegradationInfo {
    name: "equalize",
    description: "Apply a two-pole peaking equalisation (EQ) filter",
    parameters: &[
        ParameterInfo {
            name: "central_freq",
            example: "100",
            description: "Central frequency of filter in Hz",
        },
        ParameterInfo {
            name: "bandwidth",
            example: "50",
            description: "Bandwith of filter in Hz",
        },
        ParameterInfo {
            name: "gain",
            example: "-10",
            description: "Gain of filter in dBs",
        },
    ],
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EqualizationParams {
    pub central_freq: f64,
    pub bandwidth: f64,
    pub gain: f64,
}

/// Peaking biquad with `Q = central_freq / bandwidth`, run on each channel
/// with its own state.
pub struct Equalization;

impl DegradationKind for Equalization {
    type Params = EqualizationParams;

    fn info() -> &'static DegradationInfo {
        &EQUALIZATION_INFO
    }

    fn parse(values: &ParameterValues) -> Result<EqualizationParams, DegradationError> {
        Ok(EqualizationParams {
            central_freq: values.parse_positive(&EQUALIZATION_INFO, "central_freq")?,
            bandwidth: values.parse_positive(&EQUALIZATION_INFO, "bandwidth")?,
            gain: values.parse_f64(&EQUALIZATION_INFO, "gain")?,
        })
    }

    fn process(
        params: &EqualizationParams,
        audio: &mut AudioBuffer,
        _env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let rate = audio.sample_rate() as f64;
        let nyquist = rate / 2.0;
        if params.central_freq >= nyquist {
            return Err(DegradationError::invalid_parameter(
                EQUALIZATION_INFO.name,
                "central_freq",
                params.central_freq.to_string(),
                format!("must be below the Nyquist frequency ({nyquist} Hz)"),
            ));
        }
        log::info!(
            "Equalizing. f={}, bw={}, gain={}",
            params.central_freq,
            params.bandwidth,
            params.gain
        );
        let q = params.central_freq / params.bandwidth;
        let filter = Biquad::peaking(rate, params.central_freq, q, params.gain);
        let filtered = kernels::map_channels(audio.samples(), |ch| filter.process(ch));
        audio.set_samples(filtered)?;
        Ok(())
    }
}
