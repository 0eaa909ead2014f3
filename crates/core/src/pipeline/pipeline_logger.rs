use std::time::Instant;

/// Observer for the events of one degradation chain run.
pub trait PipelineLogger: Send {
    /// A degradation is about to run (1-based position in the chain).
    fn progress(&mut self, current: usize, total: usize);

    /// The named degradation finished after `duration_ms`.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A measurement of the audio, such as the output RMS.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once after the output file is written.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Debug)]
struct StepTiming {
    name: String,
    duration_ms: f64,
}

/// Logger writing through the `log` facade. Keeps the chain's steps in
/// order so the closing summary can report where the time went.
pub struct LogPipelineLogger {
    start_time: Instant,
    total_steps: usize,
    steps: Vec<StepTiming>,
    metrics: Vec<(String, f64)>,
}

impl LogPipelineLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_steps: 0,
            steps: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// One line per applied degradation in chain order, then the latest
    /// value of each metric. `None` before anything ran.
    pub fn summary_string(&self) -> Option<String> {
        if self.steps.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let applied_ms: f64 = self.steps.iter().map(|s| s.duration_ms).sum();
        let mut lines = vec![format!(
            "Applied {}/{} degradations in {:.1}s:",
            self.steps.len(),
            self.total_steps.max(self.steps.len()),
            elapsed_ms / 1000.0
        )];

        for (i, step) in self.steps.iter().enumerate() {
            let share = if applied_ms > 0.0 {
                step.duration_ms / applied_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {:>2}. {:14} {:8.1}ms ({share:4.1}%)",
                i + 1,
                step.name,
                step.duration_ms
            ));
        }
        for (name, value) in &self.metrics {
            lines.push(format!("  {name}: {value:.4}"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_steps = total;
        log::debug!("Degradation {current}/{total}");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.1}ms");
        self.steps.push(StepTiming {
            name: stage.to_string(),
            duration_ms,
        });
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.iter_mut().find(|(n, _)| n == name) {
            Some((_, last)) => *last = value,
            None => self.metrics.push((name.to_string(), value)),
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
