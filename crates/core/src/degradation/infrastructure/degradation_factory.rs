use crate::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::audio::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;
use crate::audio::infrastructure::process_tool::ProcessTool;
use crate::audio::infrastructure::rubato_resampler::RubatoResampler;
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::registry::{DegradationFactory, DegradationRegistry};
use crate::shared::config::DegraderConfig;
use crate::shared::resource_resolver::ResourceResolver;

use super::convolution_degradation::Convolution;
use super::dr_compression_degradation::DrCompression;
use super::equalization_degradation::Equalization;
use super::gain_degradation::Gain;
use super::mix_degradation::Mix;
use super::mp3_degradation::Mp3;
use super::normalization_degradation::Normalization;
use super::pitch_shift_degradation::PitchShift;
use super::resample_degradation::Resample;
use super::speed_degradation::Speed;
use super::time_stretch_degradation::TimeStretch;
use super::trim_degradation::Trim;

/// Factories of every built-in degradation, in registration order.
pub fn builtin_factories() -> Vec<DegradationFactory> {
    vec![
        DegradationFactory::of::<Trim>(),
        DegradationFactory::of::<Mp3>(),
        DegradationFactory::of::<Gain>(),
        DegradationFactory::of::<Normalization>(),
        DegradationFactory::of::<Mix>(),
        DegradationFactory::of::<Resample>(),
        DegradationFactory::of::<Convolution>(),
        DegradationFactory::of::<Speed>(),
        DegradationFactory::of::<PitchShift>(),
        DegradationFactory::of::<TimeStretch>(),
        DegradationFactory::of::<Equalization>(),
        DegradationFactory::of::<DrCompression>(),
    ]
}

/// Registry of every built-in degradation.
pub fn builtin_registry() -> DegradationRegistry {
    builtin_factories().into_iter().collect()
}

/// Production environment: ffmpeg for decoding and encoding, rubato for
/// resampling, child processes for sox.
pub fn create_env(config: &DegraderConfig) -> DegradationEnv {
    log::debug!(
        "Resources in {}, temporary files in {}, tool timeout {}s",
        config.resources_dir.display(),
        config.tmp_dir.display(),
        config.tool_timeout.as_secs()
    );
    DegradationEnv {
        reader: Box::new(FfmpegAudioReader),
        writer: Box::new(FfmpegAudioWriter),
        resampler: Box::new(RubatoResampler::new()),
        tool: Box::new(ProcessTool::new(config.tool_timeout)),
        resources: ResourceResolver::new(config.resources_dir.clone(), config.cache_dir.clone()),
        tmp_dir: config.tmp_dir.clone(),
        sox_program: config.sox_program.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_builtin_factories_have_unique_names() {
        let factories = builtin_factories();
        let mut names: Vec<_> = factories.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), factories.len());
    }

    #[test]
    fn test_builtin_names_in_registration_order() {
        assert_eq!(
            builtin_registry().names(),
            vec![
                "trim_from",
                "mp3",
                "gain",
                "normalization",
                "mix",
                "resample",
                "convolution",
                "speed",
                "pitch_shift",
                "time_stretch",
                "equalize",
                "dr_compression",
            ]
        );
    }

    #[test]
    fn test_every_example_configures() {
        let registry = builtin_registry();
        for factory in registry.all() {
            let mut op = factory.create();
            let values = factory
                .info
                .parameters
                .iter()
                .map(|p| (p.name, p.example))
                .collect();
            op.configure(values)
                .unwrap_or_else(|e| panic!("{} example rejected: {e}", factory.name()));
        }
    }

    #[test]
    fn test_create_env_uses_config() {
        let config = DegraderConfig {
            resources_dir: PathBuf::from("/res"),
            cache_dir: PathBuf::from("/cache"),
            tmp_dir: PathBuf::from("/scratch"),
            tool_timeout: Duration::from_secs(5),
            sox_program: "/usr/local/bin/sox".into(),
        };
        let env = create_env(&config);
        assert_eq!(env.resources.resources_dir(), PathBuf::from("/res"));
        assert_eq!(env.resources.cache_dir(), PathBuf::from("/cache"));
        assert_eq!(env.tmp_dir, PathBuf::from("/scratch"));
        assert_eq!(env.sox_program, "/usr/local/bin/sox");
    }
}
