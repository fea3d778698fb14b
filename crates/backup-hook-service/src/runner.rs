//! Backup script execution.
//!
//! Arguments are handed to the child as separate argv entries; no shell ever
//! parses caller-supplied text. Each run is bounded by a timeout. On unix the
//! script leads its own process group, so a timeout or a dropped request
//! kills everything the script started, not just the interpreter.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, instrument};

use backup_hook_core::HookConfig;

/// Result of a successful script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code (always `Some(0)` for a successful run).
    pub exit_code: Option<i32>,
    /// Interleaved stdout and stderr.
    pub output: Vec<u8>,
}

/// Errors that can occur while running the backup script.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The process could not be started.
    #[error("failed to spawn backup script: {0}")]
    Spawn(#[source] io::Error),

    /// Reading output or waiting on the process failed.
    #[error("failed to collect backup script output: {0}")]
    Io(#[source] io::Error),

    /// The script exited unsuccessfully. `exit_code` is `None` when it was
    /// terminated by a signal.
    #[error("backup script exited with status {exit_code:?}")]
    Failed {
        /// Process exit code.
        exit_code: Option<i32>,
        /// Combined output captured before exit.
        output: Vec<u8>,
    },

    /// The script outlived its timeout and was killed.
    #[error("backup script timed out after {timeout:?}")]
    TimedOut {
        /// Configured timeout.
        timeout: Duration,
        /// Combined output captured before the kill.
        output: Vec<u8>,
    },
}

impl RunError {
    /// Output captured before the failure, if any.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        match self {
            Self::Failed { output, .. } | Self::TimedOut { output, .. } => output,
            Self::Spawn(_) | Self::Io(_) => &[],
        }
    }

    /// Exit code of the failed process, if it exited on its own.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

/// Runs the backup script with caller-supplied arguments.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `script_path` with `args`, returning its combined output.
    async fn run(&self, script_path: &Path, args: &[String]) -> Result<ScriptOutput, RunError>;
}

/// [`ScriptRunner`] backed by a real child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: Option<PathBuf>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner.
    ///
    /// With an `interpreter` the command is `interpreter script args...`,
    /// otherwise the script is executed directly.
    #[must_use]
    pub fn new(interpreter: Option<PathBuf>, working_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            interpreter,
            working_dir,
            timeout,
        }
    }

    /// Create a runner from the hook configuration.
    #[must_use]
    pub fn from_config(config: &HookConfig) -> Self {
        Self::new(
            config.interpreter.clone(),
            config.working_dir.clone(),
            config.script_timeout,
        )
    }

    fn command(&self, script_path: &Path, args: &[String]) -> Command {
        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(script_path);
                command
            }
            None => Command::new(script_path),
        };

        command
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        command
    }
}

/// Kills the script's process group when dropped, unless disarmed.
///
/// Armed from spawn until the script has been reaped.
struct GroupKill {
    pgid: Option<i32>,
}

impl GroupKill {
    fn arm(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|id| i32::try_from(id).ok()),
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: i32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        // Group already gone.
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid, error = %e, "Failed to kill backup script process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: i32) {}

#[async_trait]
impl ScriptRunner for ProcessRunner {
    #[instrument(
        skip(self, script_path, args),
        fields(script = %script_path.display(), arg_count = args.len())
    )]
    async fn run(&self, script_path: &Path, args: &[String]) -> Result<ScriptOutput, RunError> {
        let mut child = self
            .command(script_path, args)
            .spawn()
            .map_err(RunError::Spawn)?;
        // Declared after `child` so it drops first, while the group leader is
        // still unreaped.
        let mut group = GroupKill::arm(&child);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunError::Io(io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunError::Io(io::Error::other("stderr was not captured")))?;

        let mut output = Vec::new();
        let outcome = tokio::time::timeout(self.timeout, async {
            read_combined(stdout, stderr, &mut output).await?;
            child.wait().await
        })
        .await;

        match outcome {
            Err(_elapsed) => {
                group.kill();
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill timed out backup script");
                }
                Err(RunError::TimedOut {
                    timeout: self.timeout,
                    output,
                })
            }
            Ok(Err(e)) => Err(RunError::Io(e)),
            Ok(Ok(status)) if status.success() => {
                group.disarm();
                debug!(output_bytes = output.len(), "Backup script exited successfully");
                Ok(ScriptOutput {
                    exit_code: status.code(),
                    output,
                })
            }
            Ok(Ok(status)) => {
                group.disarm();
                Err(RunError::Failed {
                    exit_code: status.code(),
                    output,
                })
            }
        }
    }
}

/// Drain both pipes into one buffer in arrival order until both close.
async fn read_combined(
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    output: &mut Vec<u8>,
) -> io::Result<()> {
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                match read? {
                    0 => out_open = false,
                    n => output.extend_from_slice(&out_buf[..n]),
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                match read? {
                    0 => err_open = false,
                    n => output.extend_from_slice(&err_buf[..n]),
                }
            }
        }
    }

    Ok(())
}
