use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Captured result of an external program run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Domain interface for running an external DSP program to completion.
pub trait ExternalTool: Send {
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError>;
}
