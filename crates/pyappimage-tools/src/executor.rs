use crate::tool::ToolError;

/// Captured result of one external tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code for logs; `-1` stands in for termination by signal.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

impl From<std::process::Output> for ToolOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over external tool execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// A non-zero exit is not an error here; callers decide what it means.
#[allow(async_fn_in_trait)]
pub trait ToolExecutor: Send + Sync {
    /// Run `program` to completion, capturing stdout and stderr.
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as child processes.
pub struct RealExecutor;

impl ToolExecutor for RealExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        use std::process::Stdio;

        tracing::debug!(program, ?args, "running tool");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ToolError::Wait {
                program: program.to_owned(),
                source: e,
            })?;

        let output = ToolOutput::from(output);
        tracing::debug!(program, code = ?output.code, "tool exited");
        Ok(output)
    }
}
