use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::domain::external_tool::{ExternalTool, ToolError, ToolOutput};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs external programs as child processes with a wall-clock timeout.
///
/// stdout and stderr are drained on background threads so a chatty tool
/// cannot block on a full pipe. A process that overruns the timeout is
/// killed.
pub struct ProcessTool {
    timeout: Duration,
}

impl ProcessTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ExternalTool for ProcessTool {
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        log::debug!("Running {program} {}", args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::Timeout {
                    program: program.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        Ok(ToolOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            exit_code: status.code(),
        })
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>, ToolError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let tool = ProcessTool::new(Duration::from_secs(5));
        let result = tool.run("definitely-not-a-real-program-xyz", &[]);
        assert!(matches!(result, Err(ToolError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let tool = ProcessTool::new(Duration::from_secs(5));
        let args = vec!["-c".to_string(), "echo hello; echo oops >&2; exit 3".to_string()];
        let output = tool.run("sh", &args).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_overrunning_process_is_killed() {
        let tool = ProcessTool::new(Duration::from_millis(100));
        let args = vec!["5".to_string()];
        let start = Instant::now();
        let result = tool.run("sleep", &args);
        assert!(matches!(result, Err(ToolError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
