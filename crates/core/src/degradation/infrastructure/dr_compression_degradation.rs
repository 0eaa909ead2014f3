use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;

use super::tool_round_trip::{path_arg, sox_round_trip};

pub static DR_COMPRESSION_INFO: DegradationInfo = DegradationInfo {
    name: "dr_compression",
    description: "Apply dynamic range compression",
    parameters: &[ParameterInfo {
        name: "degree",
        example: "1",
        description: "Degree of compression. Presets from 1 (soft) to 3 (hard)",
    }],
};

const COMPRESSED_FILE: &str = "compressed.wav";

/// `sox compand` attack/decay, transfer function and gain per degree.
const COMPAND_PRESETS: [&str; 3] = [
    "0.01,0.20 -40,-10,-30 5",
    "0.01,0.20 -50,-50,-40,-30,-40,-10,-30 12",
    "0.01,0.1 -70,-60,-70,-30,-70,0,-70 45",
];

/// Preset-based dynamic range compression through `sox compand`.
pub struct DrCompression;

impl DegradationKind for DrCompression {
    /// Degree, 1 to 3.
    type Params = usize;

    fn info() -> &'static DegradationInfo {
        &DR_COMPRESSION_INFO
    }

    fn parse(values: &ParameterValues) -> Result<usize, DegradationError> {
        let degree: usize = values.parse(&DR_COMPRESSION_INFO, "degree")?;
        if !(1..=COMPAND_PRESETS.len()).contains(&degree) {
            return Err(DegradationError::invalid_parameter(
                DR_COMPRESSION_INFO.name,
                "degree",
                degree.to_string(),
                format!("must be between 1 and {}", COMPAND_PRESETS.len()),
            ));
        }
        Ok(degree)
    }

    fn process(
        degree: &usize,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let preset = COMPAND_PRESETS[degree - 1];
        log::info!("Compressing dynamic range with preset {degree}: compand {preset}");
        let expected = audio.sample_rate();
        let compressed = sox_round_trip(audio, env, COMPRESSED_FILE, |input, output| {
            let mut args = vec![path_arg(input), path_arg(output), "compand".to_string()];
            args.extend(preset.split_whitespace().map(str::to_string));
            args
        })?;

        if compressed.sample_rate() != expected {
            return Err(DegradationError::SampleRateMismatch {
                expected,
                actual: compressed.sample_rate(),
            });
        }
        audio.set_samples(compressed.samples().clone())?;
        Ok(())
    }
}
