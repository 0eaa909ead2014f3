use std::path::Path;

use crate::degradation::domain::degradation_error::DegradationError;

use super::pipeline_executor::{AppliedDegradation, PipelineExecutor};

/// Load a file, run a chain of degradation specs over it, save the result.
pub struct DegradeAudioUseCase {
    executor: PipelineExecutor,
}

impl DegradeAudioUseCase {
    pub fn new(executor: PipelineExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &PipelineExecutor {
        &self.executor
    }

    pub fn run<S: AsRef<str>>(
        &mut self,
        input_path: &Path,
        specs: &[S],
        output_path: &Path,
    ) -> Result<(), DegradationError> {
        // Reject bad specs before touching the input file.
        let degradations = self.executor.parser().parse_all(specs)?;

        let mut audio = self.executor.env().reader.load(input_path)?;
        log::info!(
            "Loaded {} ({} frames at {} Hz)",
            input_path.display(),
            audio.frames(),
            audio.sample_rate()
        );

        self.executor.run(&mut audio, degradations)?;

        self.executor.env().writer.save(output_path, &audio)?;
        log::info!("Wrote {}", output_path.display());
        self.executor.finish();
        Ok(())
    }

    pub fn applied_degradations(&self) -> &[AppliedDegradation] {
        self.executor.applied_degradations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_buffer::AudioBuffer;
    use crate::degradation::domain::degradation_env::tests::Stubs;
    use crate::degradation::infrastructure::degradation_factory::builtin_registry;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn use_case(stubs: &Stubs, tmp: &TempDir) -> DegradeAudioUseCase {
        DegradeAudioUseCase::new(PipelineExecutor::new(
            builtin_registry(),
            stubs.env(tmp),
        ))
    }

    #[test]
    fn test_run_loads_degrades_and_saves() {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();
        let tone: Vec<f32> = (0..1600)
            .map(|i| 0.25 + 0.2 * (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 16000.0).sin())
            .collect();
        stubs
            .reader
            .insert("in.wav", AudioBuffer::from_channels(vec![tone], 16000).unwrap());
        let output = tmp.path().join("out.wav");

        let mut uc = use_case(&stubs, &tmp);
        uc.run(
            &tmp.path().join("in.wav"),
            &["gain,-6", "normalization", "resample,8000"],
            &output,
        )
        .unwrap();

        let saved = stubs.writer.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, output);
        assert_eq!(saved[0].1.sample_rate(), 8000);
        assert_eq!(saved[0].1.frames(), 800);
        assert_relative_eq!(saved[0].1.peak(), 1.0, epsilon = 1e-5);
        assert!(saved[0].1.mean().abs() < 1e-3);
        assert_eq!(uc.applied_degradations().len(), 3);
    }

    #[test]
    fn test_bad_spec_fails_before_loading() {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();

        let mut uc = use_case(&stubs, &tmp);
        let err = uc
            .run(
                &tmp.path().join("in.wav"),
                &["gain,-6", "gain"],
                &tmp.path().join("out.wav"),
            )
            .unwrap_err();

        assert!(matches!(err, DegradationError::MalformedSpec { .. }));
        assert!(stubs.reader.loads.lock().unwrap().is_empty());
        assert!(stubs.writer.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_input_is_audio_error() {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();

        let mut uc = use_case(&stubs, &tmp);
        let err = uc
            .run(&tmp.path().join("missing.wav"), &["gain,1"], &tmp.path().join("out.wav"))
            .unwrap_err();

        assert!(matches!(err, DegradationError::Audio(_)));
    }

    #[test]
    fn test_failed_degradation_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();
        stubs
            .reader
            .insert("in.wav", AudioBuffer::silent(10_000, 8000).unwrap());

        let mut uc = use_case(&stubs, &tmp);
        let err = uc
            .run(
                &tmp.path().join("in.wav"),
                &["gain,-6", "normalization"],
                &tmp.path().join("out.wav"),
            )
            .unwrap_err();

        assert!(matches!(err, DegradationError::DegenerateSignal(_)));
        assert!(stubs.writer.saved.lock().unwrap().is_empty());
        assert_eq!(uc.applied_degradations().len(), 1);
    }

    #[test]
    fn test_empty_chain_copies_input() {
        let tmp = TempDir::new().unwrap();
        let stubs = Stubs::default();
        let audio = AudioBuffer::from_channels(vec![vec![0.1, 0.2, 0.3]], 8000).unwrap();
        stubs.reader.insert("in.wav", audio.clone());

        let mut uc = use_case(&stubs, &tmp);
        let specs: [&str; 0] = [];
        uc.run(&tmp.path().join("in.wav"), &specs, &tmp.path().join("out.wav"))
            .unwrap();

        assert_eq!(stubs.writer.saved.lock().unwrap()[0].1, audio);
    }
}
