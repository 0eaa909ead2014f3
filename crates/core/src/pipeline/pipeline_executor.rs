use std::time::Instant;

use crate::audio::domain::audio_buffer::AudioBuffer;
use crate::degradation::domain::degradation::{Degradation, ParameterValues};
use crate::degradation::domain::degradation_env::DegradationEnv;
use crate::degradation::domain::degradation_error::DegradationError;
use crate::degradation::domain::grammar::SpecGrammar;
use crate::degradation::domain::parameters_parser::ParametersParser;
use crate::degradation::domain::registry::DegradationRegistry;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// One entry of the executor's audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedDegradation {
    pub name: &'static str,
    pub parameters: ParameterValues,
}

/// Applies degradations in order to a shared buffer.
///
/// Fails fast: the first error aborts the run, the buffer keeps the
/// mutations made by earlier steps, and the failing step is not recorded.
pub struct PipelineExecutor {
    registry: DegradationRegistry,
    env: DegradationEnv,
    grammar: SpecGrammar,
    logger: Box<dyn PipelineLogger>,
    history: Vec<AppliedDegradation>,
}

impl PipelineExecutor {
    pub fn new(registry: DegradationRegistry, env: DegradationEnv) -> Self {
        Self {
            registry,
            env,
            grammar: SpecGrammar::default(),
            logger: Box::new(NullPipelineLogger),
            history: Vec::new(),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_grammar(mut self, grammar: SpecGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn parser(&self) -> ParametersParser<'_> {
        ParametersParser::with_grammar(&self.registry, self.grammar.clone())
    }

    pub fn registry(&self) -> &DegradationRegistry {
        &self.registry
    }

    pub fn env(&self) -> &DegradationEnv {
        &self.env
    }

    /// Names and values of the degradations applied so far, in order.
    pub fn applied_degradations(&self) -> &[AppliedDegradation] {
        &self.history
    }

    /// Apply one configured degradation and record it.
    pub fn apply(
        &mut self,
        audio: &mut AudioBuffer,
        mut degradation: Box<dyn Degradation>,
    ) -> Result<(), DegradationError> {
        let name = degradation.name();
        let start = Instant::now();
        degradation.apply(audio, &self.env)?;
        self.logger
            .timing(name, start.elapsed().as_secs_f64() * 1000.0);
        self.history.push(AppliedDegradation {
            name,
            parameters: degradation.parameters_values().clone(),
        });
        Ok(())
    }

    /// Apply already-parsed degradations in order.
    pub fn run(
        &mut self,
        audio: &mut AudioBuffer,
        degradations: Vec<Box<dyn Degradation>>,
    ) -> Result<(), DegradationError> {
        let total = degradations.len();
        for (i, degradation) in degradations.into_iter().enumerate() {
            self.logger.progress(i + 1, total);
            self.logger.info(&format!("Applying {}", degradation.name()));
            self.apply(audio, degradation)?;
        }
        self.logger.metric("output_rms", audio.rms());
        Ok(())
    }

    /// Parse and apply each spec in turn.
    pub fn run_specs<S: AsRef<str>>(
        &mut self,
        audio: &mut AudioBuffer,
        specs: &[S],
    ) -> Result<(), DegradationError> {
        let total = specs.len();
        for (i, spec) in specs.iter().enumerate() {
            self.logger.progress(i + 1, total);
            let degradation = self.parser().parse(spec.as_ref())?;
            self.logger.info(&format!("Applying {}", spec.as_ref()));
            self.apply(audio, degradation)?;
        }
        self.logger.metric("output_rms", audio.rms());
        Ok(())
    }

    /// Emit the logger's end-of-pipeline summary.
    pub fn finish(&self) {
        self.logger.summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradation::domain::degradation_env::tests::{stub_env, Stubs};
    use crate::degradation::infrastructure::degradation_factory::builtin_registry;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn executor() -> (PipelineExecutor, TempDir) {
        let (env, tmp) = stub_env();
        (
            PipelineExecutor::new(builtin_registry(), env),
            tmp,
        )
    }

    #[test]
    fn test_silent_input_gain_then_normalization_fails_after_gain() {
        let (mut executor, _tmp) = executor();
        let mut audio = AudioBuffer::silent(10_000, 8000).unwrap();

        let err = executor
            .run_specs(&mut audio, &["gain,-6", "normalization"])
            .unwrap_err();

        assert!(matches!(err, DegradationError::DegenerateSignal(_)));
        assert!(audio.samples().iter().all(|&x| x == 0.0));
        let names: Vec<_> = executor
            .applied_degradations()
            .iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["gain"]);
    }

    #[test]
    fn test_run_specs_applies_in_order_and_records_values() {
        let (mut executor, _tmp) = executor();
        let mut audio = AudioBuffer::from_channels(vec![vec![0.1; 8000]], 8000).unwrap();

        executor
            .run_specs(&mut audio, &["trim_from,0.5", "gain,6"])
            .unwrap();

        assert_eq!(audio.frames(), 4000);
        assert_relative_eq!(audio.samples()[[0, 0]], 0.1 * 10f32.powf(0.3), epsilon = 1e-6);
        let history = executor.applied_degradations();
        assert_eq!(history[0].name, "trim_from");
        assert_eq!(history[0].parameters.get("start_time"), Some("0.5"));
        assert_eq!(history[1].parameters.get("value"), Some("6"));
    }

    #[test]
    fn test_parse_error_stops_before_later_steps() {
        let (mut executor, _tmp) = executor();
        let mut audio = AudioBuffer::from_channels(vec![vec![0.1; 10]], 8000).unwrap();

        let err = executor
            .run_specs(&mut audio, &["gain,6", "frobnicate,1", "gain,6"])
            .unwrap_err();

        assert!(matches!(err, DegradationError::UnknownDegradation(_)));
        assert_eq!(executor.applied_degradations().len(), 1);
        assert_relative_eq!(audio.samples()[[0, 0]], 0.1 * 10f32.powf(0.3), epsilon = 1e-6);
    }

    #[test]
    fn test_run_with_pre_parsed_degradations() {
        let (mut executor, _tmp) = executor();
        let parsed = executor
            .parser()
            .parse_all(&["gain,-20", "normalization"])
            .unwrap();
        let mut audio = AudioBuffer::from_channels(vec![vec![0.5, -0.25, 0.0]], 8000).unwrap();

        executor.run(&mut audio, parsed).unwrap();

        assert_relative_eq!(audio.peak(), 1.0, epsilon = 1e-6);
        assert_eq!(executor.applied_degradations().len(), 2);
    }

    #[test]
    fn test_custom_grammar_reaches_parser() {
        let tmp = TempDir::new().unwrap();
        let executor = PipelineExecutor::new(
            builtin_registry(),
            Stubs::default().env(&tmp),
        )
        .with_grammar(SpecGrammar::with_parameters_sep("//"));
        let eq = executor.parser().parse("equalize,100//50//-10").unwrap();
        assert_eq!(eq.parameters_values().get("gain"), Some("-10"));
    }

    struct RecordingLogger {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.events.lock().unwrap().push(format!("progress {current}/{total}"));
        }
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.events.lock().unwrap().push(format!("timing {stage}"));
        }
        fn metric(&mut self, name: &str, _value: f64) {
            self.events.lock().unwrap().push(format!("metric {name}"));
        }
        fn info(&mut self, _message: &str) {}
    }

    #[test]
    fn test_logger_receives_progress_and_timings() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (env, _tmp) = stub_env();
        let mut executor =
            PipelineExecutor::new(builtin_registry(), env)
                .with_logger(Box::new(RecordingLogger {
                    events: events.clone(),
                }));
        let mut audio = AudioBuffer::from_channels(vec![vec![0.1; 10]], 8000).unwrap();

        executor
            .run_specs(&mut audio, &["gain,1", "gain,-1"])
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "progress 1/2",
                "timing gain",
                "progress 2/2",
                "timing gain",
                "metric output_rms",
            ]
        );
    }
}
