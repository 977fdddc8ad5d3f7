//! Process boundary to the `fiberpath` executable.

use async_trait::async_trait;
use fiberpath_core::CommandError;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Name of the CLI executable looked up on `PATH`
pub const CLI_NAME: &str = "fiberpath";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Captured result of one CLI run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// The error describing an unsuccessful run
    pub fn exit_error(&self) -> CommandError {
        CommandError::Exit {
            status: self
                .status
                .map(|code| code.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            stdout: self.stdout.trim().to_string(),
            stderr: self.stderr.trim().to_string(),
        }
    }

    /// `Ok(self)` on success, the exit error otherwise
    pub fn check(self) -> Result<Self, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(self.exit_error())
        }
    }
}

/// Runs the CLI with a list of arguments
///
/// A run that starts and exits, successfully or not, is `Ok`; only a
/// failure to launch is an error at this level.
#[async_trait]
pub trait CliRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<CliOutput, CommandError>;
}

/// [`CliRunner`] that spawns the real executable
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Locate the CLI: an explicitly configured path first, then `PATH`
    pub fn resolve(configured: Option<&Path>) -> Result<Self, CommandError> {
        if let Some(path) = configured {
            if path.is_file() {
                tracing::info!("Using configured fiberpath CLI at {}", path.display());
                return Ok(Self::new(path));
            }
            return Err(CommandError::CliNotFound {
                reason: format!("{} does not exist or is not a file", path.display()),
            });
        }

        match which::which(CLI_NAME) {
            Ok(path) => {
                tracing::info!("Found fiberpath CLI on PATH: {}", path.display());
                Ok(Self::new(path))
            }
            Err(e) => {
                tracing::warn!("fiberpath CLI not found on PATH: {}", e);
                Err(CommandError::CliNotFound {
                    reason: format!(
                        "{}. Install it with `pip install fiberpath` or set cli.executable",
                        e
                    ),
                })
            }
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl CliRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> Result<CliOutput, CommandError> {
        let joined = args.join(" ");
        tracing::debug!("Running {} {}", self.executable.display(), joined);

        let mut command = tokio::process::Command::new(&self.executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let output = command.output().await.map_err(|e| CommandError::Launch {
            reason: format!("{} while running `{} {}`", e, CLI_NAME, joined),
        })?;

        let result = CliOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(status = ?result.status, "fiberpath finished");
        Ok(result)
    }
}
