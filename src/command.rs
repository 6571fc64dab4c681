//! External command execution with a hard timeout per call.
//!
//! Output is captured through anonymous temp files rather than pipes so a
//! chatty child can never block on a full pipe while we wait on it.

use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::errors::{Error, Result};

pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the cleaner and the package manager, journal and snapshot CLIs.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<CommandOutput>;

    /// Run a command that needs root.
    fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        self.run(program, args, timeout)
    }

    fn is_available(&self, program: &str) -> bool;

    /// Like `run`, but a non-zero exit becomes `Error::CommandFailed`.
    fn run_checked(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String> {
        let output = self.run(program, args, timeout)?;
        ensure_success(program, output)
    }

    fn run_privileged_checked(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String> {
        let output = self.run_privileged(program, args, timeout)?;
        ensure_success(program, output)
    }
}

fn ensure_success(program: &str, output: CommandOutput) -> Result<String> {
    if output.success {
        Ok(output.stdout)
    } else {
        Err(Error::CommandFailed {
            program: program.to_string(),
            status: output
                .code
                .map_or_else(|| "signal".to_string(), |c| format!("status {c}")),
            stderr: output.stderr.trim().chars().take(200).collect(),
        })
    }
}

/// Runs real processes.
pub struct SystemRunner {
    use_sudo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            use_sudo: !is_root(),
        }
    }

    fn execute(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
        stdin: Stdio,
    ) -> Result<CommandOutput> {
        let mut stdout = tempfile::tempfile().map_err(|e| Error::io("stdout capture", e))?;
        let mut stderr = tempfile::tempfile().map_err(|e| Error::io("stderr capture", e))?;

        let stdout_handle = stdout.try_clone().map_err(|e| Error::io("stdout capture", e))?;
        let stderr_handle = stderr.try_clone().map_err(|e| Error::io("stderr capture", e))?;

        tracing::debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning");
        let mut child = match Command::new(program)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::from(stdout_handle))
            .stderr(Stdio::from(stderr_handle))
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CommandMissing {
                    program: program.to_string(),
                });
            }
            Err(e) => return Err(Error::io(program, e)),
        };

        let status = match child
            .wait_timeout(timeout)
            .map_err(|e| Error::io(program, e))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::CommandTimeout {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: read_capture(&mut stdout),
            stderr: read_capture(&mut stderr),
        })
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
        self.execute(program, args, timeout, Stdio::null())
    }

    fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        if !self.use_sudo {
            return self.execute(program, args, timeout, Stdio::null());
        }
        let mut sudo_args = Vec::with_capacity(args.len() + 1);
        sudo_args.push(program);
        sudo_args.extend_from_slice(args);
        // sudo may need the terminal for a password prompt.
        self.execute("sudo", &sudo_args, timeout, Stdio::inherit())
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn read_capture(file: &mut std::fs::File) -> String {
    let mut buf = Vec::new();
    if file.seek(SeekFrom::Start(0)).is_err() || file.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
