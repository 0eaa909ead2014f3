use std::path::PathBuf;

use tempfile::TempDir;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::audio::domain::external_tool::{ExternalTool, ToolOutput};
use crate::audio::domain::resampler::Resampler;
use crate::shared::resource_resolver::ResourceResolver;

use super::degradation_error::DegradationError;

/// Collaborators available to every degradation while it is applied.
pub struct DegradationEnv {
    pub reader: Box<dyn AudioReader>,
    pub writer: Box<dyn AudioWriter>,
    pub resampler: Box<dyn Resampler>,
    pub tool: Box<dyn ExternalTool>,
    pub resources: ResourceResolver,
    /// Parent of the scoped directories handed out by [`scratch_dir`](Self::scratch_dir).
    pub tmp_dir: PathBuf,
    pub sox_program: String,
}

impl DegradationEnv {
    /// A fresh directory inside `tmp_dir`, removed when the guard drops.
    pub fn scratch_dir(&self) -> Result<TempDir, DegradationError> {
        std::fs::create_dir_all(&self.tmp_dir)?;
        Ok(tempfile::Builder::new()
            .prefix("audio-degrader-")
            .tempdir_in(&self.tmp_dir)?)
    }

    /// Run an external program; a non-zero exit becomes
    /// [`DegradationError::ExternalTool`].
    pub fn run_tool(&self, program: &str, args: &[String]) -> Result<ToolOutput, DegradationError> {
        let output = self.tool.run(program, args)?;
        if !output.success() {
            return Err(DegradationError::ExternalTool {
                program: program.to_string(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    pub fn run_sox(&self, args: &[String]) -> Result<ToolOutput, DegradationError> {
        self.run_tool(&self.sox_program, args)
    }
}
