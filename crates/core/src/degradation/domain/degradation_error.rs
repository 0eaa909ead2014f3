use thiserror::Error;

use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::external_tool::ToolError;
use crate::shared::resource_resolver::ResourceError;

#[derive(Error, Debug)]
pub enum DegradationError {
    #[error("unknown degradation: {0}")]
    UnknownDegradation(String),
    #[error("malformed degradation \"{spec}\": {reason}")]
    MalformedSpec { spec: String, reason: String },
    #[error("invalid value \"{value}\" for {degradation}.{parameter}: {reason}")]
    InvalidParameter {
        degradation: String,
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("{0} applied before being configured")]
    NotConfigured(String),
    #[error("{0} was already applied")]
    AlreadyApplied(String),
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),
    #[error("{program} exited with {}: {stderr}", describe_exit(.exit_code))]
    ExternalTool {
        program: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("sample rate changed from {expected} Hz to {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

impl DegradationError {
    pub fn invalid_parameter(
        degradation: &str,
        parameter: &str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            degradation: degradation.to_string(),
            parameter: parameter.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message_names_exit_status() {
        let err = DegradationError::ExternalTool {
            program: "sox".into(),
            exit_code: Some(2),
            stdout: String::new(),
            stderr: "sox FAIL formats".into(),
        };
        assert_eq!(err.to_string(), "sox exited with status 2: sox FAIL formats");
    }

    #[test]
    fn test_external_tool_message_for_signal() {
        let err = DegradationError::ExternalTool {
            program: "sox".into(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().starts_with("sox exited with a signal"));
    }
}
