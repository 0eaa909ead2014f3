use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{
    DegradationInfo, DegradationKind, ParameterInfo, ParameterValues,
};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::kernels;

pub static MIX_INFO: DegradationInfo = DegradationInfo {
    name: "mix",
    description: "Mix input with a specified noise. The noise can be specified with its full path, URL, or relative to the resources directory",
    parameters: &[
        ParameterInfo {
            name: "noise",
            example: "sounds/ambience-pub.wav",
            description: "Full or relative path (to resources dir) of noise",
        },
        ParameterInfo {
            name: "snr",
            example: "6",
            description: "Desired Signal-to-Noise-Ratio [dB]",
        },
    ],
};

#[derive(Clone, Debug, PartialEq)]
pub struct MixParams {
    pub noise: String,
    pub snr: f64,
}

/// Adds a noise recording at a target SNR, keeping the input RMS.
pub struct Mix;

impl DegradationKind for Mix {
    type Params = MixParams;

    fn info() -> &'static DegradationInfo {
        &MIX_INFO
    }

    fn parse(values: &ParameterValues) -> Result<MixParams, DegradationError> {
        let noise = values.require(&MIX_INFO, "noise")?.trim();
        if noise.is_empty() {
            return Err(DegradationError::invalid_parameter(
                MIX_INFO.name,
                "noise",
                noise,
                "empty path",
            ));
        }
        Ok(MixParams {
            noise: noise.to_string(),
            snr: values.parse_f64(&MIX_INFO, "snr")?,
        })
    }

    fn process(
        params: &MixParams,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let path = env.resources.resolve(&params.noise)?;
        log::info!("Mixing with {} at {} dB SNR", path.display(), params.snr);

        let noise = env.reader.load(&path)?;
        let noise_samples = if noise.sample_rate() != audio.sample_rate() {
            log::debug!(
                "Resampling noise from {} Hz to {} Hz",
                noise.sample_rate(),
                audio.sample_rate()
            );
            env.resampler
                .resample(noise.samples(), noise.sample_rate(), audio.sample_rate())?
        } else {
            noise.samples().clone()
        };

        let fitted = kernels::fit_length(&noise_samples, audio.frames())?;
        kernels::mix_at_snr(audio, &fitted, params.snr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradation::domain::degradation_env::tests::Stubs;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn noisy(frames: usize, rate: u32) -> AudioBuffer {
        let samples = Array2::from_shape_fn((2, frames), |(c, i)| {
            (((i * 31 + c * 17) % 23) as f32 - 11.0) / 30.0
        });
        AudioBuffer::new(samples, rate).unwrap()
    }

    fn setup(noise: AudioBuffer) -> (Stubs, TempDir) {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();
        let sounds = tmp.path().join("resources/sounds");
        std::fs::create_dir_all(&sounds).unwrap();
        std::fs::write(sounds.join("hum.wav"), b"").unwrap();
        stubs.reader.insert("hum.wav", noise);
        (stubs, tmp)
    }

    fn params() -> MixParams {
        MixParams {
            noise: "sounds/hum.wav".into(),
            snr: 10.0,
        }
    }

    #[test]
    fn test_mix_resolves_relative_noise_and_keeps_rms() {
        let (stubs, tmp) = setup(noisy(300, 8000));
        let env = stubs.env(&tmp);
        let mut audio = AudioBuffer::from_channels(
            vec![(0..1000).map(|i| (i as f32 * 0.05).sin() * 0.3).collect()],
            8000,
        )
        .unwrap();
        let before = audio.clone();

        Mix::process(&params(), &mut audio, &env).unwrap();

        assert_eq!(audio.frames(), 1000);
        assert_relative_eq!(audio.rms(), before.rms(), max_relative = 1e-5);
        assert_ne!(audio, before);
        let loads = stubs.reader.loads.lock().unwrap();
        assert_eq!(loads[0], tmp.path().join("resources/sounds/hum.wav"));
    }

    #[test]
    fn test_noise_at_other_rate_is_resampled() {
        let (stubs, tmp) = setup(noisy(600, 16000));
        let env = stubs.env(&tmp);
        let mut audio = AudioBuffer::from_channels(vec![vec![0.2; 400]], 8000).unwrap();
        Mix::process(&params(), &mut audio, &env).unwrap();
        assert_eq!(*stubs.resampler.calls.lock().unwrap(), vec![(16000, 8000)]);
    }

    #[test]
    fn test_missing_noise_is_resource_error() {
        let tmp = TempDir::new().unwrap();
        let env = Stubs::default().env(&tmp);
        let mut audio = AudioBuffer::silent(10, 8000).unwrap();
        let err = Mix::process(&params(), &mut audio, &env).unwrap_err();
        assert!(matches!(err, DegradationError::Resource(_)));
    }

    #[test]
    fn test_mix_into_trimmed_away_buffer_is_noop() {
        let (stubs, tmp) = setup(noisy(300, 8000));
        let env = stubs.env(&tmp);
        let mut audio = AudioBuffer::silent(0, 8000).unwrap();
        Mix::process(&params(), &mut audio, &env).unwrap();
        assert!(audio.is_empty());
    }
}
