//! Execution wrapper for the external helpers chordboot shells out to.
//!
//! Every call runs with a deadline and captured output so a wedged helper
//! cannot hang the boot menu.

use chordboot_core::error::{BootError, BootResult};
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct SystemCommand {
    binary: PathBuf,
    timeout: Duration,
}

#[derive(Debug)]
pub(crate) struct Output {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) status: i32,
}

impl Output {
    /// Prefer stderr, falling back to stdout.
    pub(crate) fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            stderr.to_string()
        } else {
            self.stdout.trim().to_string()
        }
    }
}

impl SystemCommand {
    pub(crate) fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub(crate) fn binary(&self) -> &Path {
        &self.binary
    }

    pub(crate) fn run(&self, args: &[&str]) -> BootResult<Output> {
        debug!("running {} {}", self.binary.display(), args.join(" "));
        let mut command = Command::new(&self.binary);
        command.args(args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|err| {
            BootError::Provider(format!("failed to start {}: {err}", self.binary.display()))
        })?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        self.wait_with_timeout(child, stdout_pipe, stderr_pipe)
    }

    /// Run and turn a non-zero exit into a provider error naming `what`.
    pub(crate) fn run_checked(&self, args: &[&str], what: &str) -> BootResult<Output> {
        let out = self.run(args)?;
        if out.status == 0 {
            return Ok(out);
        }

        let diagnostic = out.diagnostic();
        let diagnostic = if diagnostic.is_empty() {
            "no additional output".to_string()
        } else {
            diagnostic
        };
        Err(BootError::Provider(format!(
            "{what} failed: {diagnostic} (exit code {})",
            out.status
        )))
    }

    fn wait_with_timeout(
        &self,
        mut child: Child,
        stdout_pipe: Option<ChildStdout>,
        stderr_pipe: Option<ChildStderr>,
    ) -> BootResult<Output> {
        let start = Instant::now();
        let stdout_handle = spawn_output_reader(stdout_pipe);
        let stderr_handle = spawn_output_reader(stderr_pipe);
        let mut exit_status = None;

        while start.elapsed() <= self.timeout {
            if let Some(status) = child.try_wait()? {
                exit_status = Some(status);
                break;
            }
            thread::sleep(Duration::from_millis(25));
        }

        let Some(exit_status) = exit_status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BootError::Provider(format!(
                "{} timed out after {:?}",
                self.binary.display(),
                self.timeout
            )));
        };

        let stdout = stdout_handle
            .join()
            .map_err(|_| BootError::Provider("stdout reader thread panicked".into()))??;
        let stderr = stderr_handle
            .join()
            .map_err(|_| BootError::Provider("stderr reader thread panicked".into()))??;

        Ok(Output {
            stdout,
            stderr,
            status: exit_status.code().unwrap_or(-1),
        })
    }
}

fn spawn_output_reader<R>(pipe: Option<R>) -> thread::JoinHandle<BootResult<String>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || -> BootResult<String> {
        if let Some(mut reader) = pipe {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).to_string())
        } else {
            Ok(String::new())
        }
    })
}
