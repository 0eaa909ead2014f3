use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels;

pub static CONVOLUTION_INFO: DegradationInfo = DegradationInfo {
    name: "convolution",
    description: "Convolve input with specified impulse response",
    parameters: &[
        ParameterInfo {
            name: "impulse_response",
            example: "impulse_responses/ir_classroom.wav",
            description: "Full or relative path (to resources dir) of impulse response",
        },
        ParameterInfo {
            name: "level",
            example: "1.0",
            description: "Wet level (0.0=dry, 1.0=wet)",
        },
    ],
};

#[derive(Clone, Debug, PartialEq)]
pub struct ConvolutionParams {
    pub impulse_response: String,
    pub level: f64,
}

/// Convolution reverb with a wet/dry blend. Output length equals input
/// length.
pub struct Convolution;

impl DegradationKind for Convolution {
    type Params = ConvolutionParams;

    fn info() -> &'static DegradationInfo {
        &CONVOLUTION_INFO
    }

    fn parse(values: &ParameterValues) -> Result<ConvolutionParams, DegradationError> {
        let ir = values.require(&CONVOLUTION_INFO, "impulse_response")?.trim();
        if ir.is_empty() {
            return Err(DegradationError::invalid_parameter(
                CONVOLUTION_INFO.name,
                "impulse_response",
                ir,
                "empty path",
            ));
        }
        Ok(ConvolutionParams {
            impulse_response: ir.to_string(),
            level: values.parse_f64(&CONVOLUTION_INFO, "level")?,
        })
    }

    fn process(
        params: &ConvolutionParams,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let path = env.resources.resolve(&params.impulse_response)?;
        log::info!(
            "Convolving with {} and level {}",
            path.display(),
            params.level
        );

        let ir = env.reader.load(&path)?;
        let ir_samples = if ir.sample_rate() != audio.sample_rate() {
            log::info!(
                "Converting IR sample rate from {} Hz to {} Hz",
                ir.sample_rate(),
                audio.sample_rate()
            );
            env.resampler
                .resample(ir.samples(), ir.sample_rate(), audio.sample_rate())?
        } else {
            ir.samples().clone()
        };

        let dry = audio.samples();
        let mut wet = dry.clone();
        for (ch, mut out) in wet.outer_iter_mut().enumerate() {
            out.assign(&kernels::convolve_truncated(dry.row(ch), ir_samples.row(ch)));
        }
        let blended = kernels::wet_dry(&wet, dry, params.level);
        audio.set_samples(blended)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradation::domain::degradation_env::tests::Stubs;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use rstest::rstest;
    use tempfile::TempDir;

    fn setup(ir: AudioBuffer) -> (Stubs, TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();
        let ir_path = tmp.path().join("room.wav");
        std::fs::write(&ir_path, b"").unwrap();
        stubs.reader.insert("room.wav", ir);
        (stubs, tmp, ir_path)
    }

    fn signal() -> AudioBuffer {
        AudioBuffer::from_channels(vec![(0..500).map(|i| (i as f32 * 0.1).sin() * 0.5).collect()], 8000)
            .unwrap()
    }

    fn delta_ir(len: usize, rate: u32) -> AudioBuffer {
        let mut samples = Array2::zeros((2, len));
        samples[[0, 0]] = 1.0;
        samples[[1, 0]] = 1.0;
        AudioBuffer::new(samples, rate).unwrap()
    }

    #[rstest]
    #[case::short(3)]
    #[case::long(2000)]
    fn test_identity_ir_keeps_signal(#[case] len: usize) {
        let (stubs, tmp, ir_path) = setup(delta_ir(len, 8000));
        let env = stubs.env(&tmp);
        let mut audio = signal();
        let before = audio.clone();
        let params = ConvolutionParams {
            impulse_response: ir_path.to_string_lossy().into_owned(),
            level: 1.0,
        };
        Convolution::process(&params, &mut audio, &env).unwrap();
        assert_eq!(audio.frames(), before.frames());
        for (a, b) in audio.samples().iter().zip(before.samples().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_zero_level_is_dry() {
        let mut ir = Array2::zeros((2, 50));
        ir.fill(0.1);
        let (stubs, tmp, ir_path) = setup(AudioBuffer::new(ir, 8000).unwrap());
        let env = stubs.env(&tmp);
        let mut audio = signal();
        let before = audio.clone();
        let params = ConvolutionParams {
            impulse_response: ir_path.to_string_lossy().into_owned(),
            level: 0.0,
        };
        Convolution::process(&params, &mut audio, &env).unwrap();
        assert_eq!(audio, before);
    }

    #[test]
    fn test_ir_is_resampled_to_signal_rate() {
        let (stubs, tmp, ir_path) = setup(delta_ir(100, 16000));
        let env = stubs.env(&tmp);
        let mut audio = signal();
        let params = ConvolutionParams {
            impulse_response: ir_path.to_string_lossy().into_owned(),
            level: 0.5,
        };
        Convolution::process(&params, &mut audio, &env).unwrap();
        assert_eq!(*stubs.resampler.calls.lock().unwrap(), vec![(16000, 8000)]);
        assert_eq!(audio.frames(), 500);
    }
}
