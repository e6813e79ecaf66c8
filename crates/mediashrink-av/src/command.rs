//! Builder for executing external tool commands.
//!
//! Commands run synchronously. stdin is fed and stdout/stderr are drained on
//! helper threads so a chatty tool can never deadlock on a full pipe.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error::EngineError;

/// How often a command with a timeout is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use mediashrink_av::ToolCommand;
/// use std::path::PathBuf;
///
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "error", "-print_format", "json", "-show_streams"])
///     .arg("/path/to/clip.mp4")
///     .execute()?;
/// println!("{}", String::from_utf8_lossy(&output.stdout));
/// # Ok::<(), mediashrink_av::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Option<Duration>,
    stdin_data: Option<Bytes>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
            stdin_data: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<OsString>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<OsString>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Kill the process if it runs longer than `d`.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Provide data to be written to the process's stdin.
    pub fn stdin(&mut self, data: Bytes) -> &mut Self {
        self.stdin_data = Some(data);
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ToolNotFound`] if the program does not exist.
    /// - [`EngineError::ToolFailed`] if spawning fails or the process exits
    ///   with a non-zero status (message is the most relevant stderr line).
    /// - [`EngineError::TimedOut`] if the timeout expired; the process is
    ///   killed first.
    pub fn execute(&self) -> Result<ToolOutput, EngineError> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // A timed command gets its own process group so a wrapper script and
        // everything it spawned can be killed together.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        tracing::debug!("running {} {:?}", self.program.display(), self.args);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::tool_not_found(&program_name)
            } else {
                EngineError::tool_failed(&program_name, format!("failed to spawn: {e}"))
            }
        })?;

        let stdin_thread = match (child.stdin.take(), self.stdin_data.clone()) {
            (Some(mut stdin), Some(data)) => Some(thread::spawn(move || {
                // The tool may stop reading early; its exit status tells us
                // whether that was a failure.
                match stdin.write_all(&data) {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };
        let stdout_thread = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                out.read_to_end(&mut buf).map(|_| buf)
            })
        });
        let stderr_thread = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).to_string()
            })
        });

        let status = wait(&mut child, self.timeout).map_err(|e| {
            EngineError::tool_failed(&program_name, format!("I/O error waiting for process: {e}"))
        })?;

        // On timeout the drain threads are left detached: a descendant that
        // escaped the kill may still hold the pipes open.
        let Some(status) = status else {
            return Err(EngineError::TimedOut {
                tool: program_name,
                timeout: self.timeout.unwrap_or_default(),
            });
        };

        let stderr = join(stderr_thread).unwrap_or_default();

        if let Some(Err(e)) = join(stdin_thread) {
            tracing::debug!("{program_name}: failed to write stdin: {e}");
        }
        let stdout = match join(stdout_thread) {
            Some(Ok(buf)) => buf,
            Some(Err(e)) => {
                return Err(EngineError::tool_failed(
                    &program_name,
                    format!("failed to read stdout: {e}"),
                ))
            }
            None => Vec::new(),
        };

        if !status.success() {
            return Err(EngineError::tool_failed(
                program_name,
                format!("exited with status {status}: {}", format_tool_error(&stderr)),
            ));
        }

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }
}

/// Wait for `child`, killing it once `timeout` has elapsed.
///
/// Returns `Ok(None)` when the process was killed for running too long.
fn wait(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child's process group, falling back to the child alone.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) => return,
            Err(e) => tracing::debug!("killpg({pid}) failed: {e}"),
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn join<T>(handle: Option<JoinHandle<T>>) -> Option<T> {
    handle.and_then(|h| h.join().ok())
}

/// Pick the most useful line out of a tool's stderr.
///
/// Prefers the last line mentioning an error, then the last non-progress
/// line.
pub fn format_tool_error(stderr: &str) -> String {
    if let Some(line) = stderr
        .lines()
        .rev()
        .find(|line| line.contains("Error") || line.contains("error") || line.contains("Invalid"))
    {
        return line.trim().to_string();
    }

    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with("frame=")
                && !line.starts_with("size=")
        })
        .map(str::to_string)
        .unwrap_or_else(|| "no diagnostic output".to_string())
}
