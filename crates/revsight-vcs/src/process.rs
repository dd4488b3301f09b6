//! External VCS process invocation with an optional timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use revsight_core::RevsightError;
use tokio::process::Command;

/// One invocation of a VCS executable, run from the repository root.
#[derive(Debug, Clone)]
pub(crate) struct VcsCommand {
    program: &'static str,
    args: Vec<OsString>,
    cwd: PathBuf,
    envs: Vec<(&'static str, &'static str)>,
}

impl VcsCommand {
    pub(crate) fn new(program: &'static str, cwd: &Path) -> Self {
        Self {
            program,
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            envs: Vec::new(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub(crate) fn env(mut self, key: &'static str, value: &'static str) -> Self {
        self.envs.push((key, value));
        self
    }

    #[cfg(test)]
    pub(crate) fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Human-readable command line for error messages.
    fn display(&self) -> String {
        let mut out = String::from(self.program);
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }

    /// Run to completion and return stdout.
    ///
    /// The child is killed if `timeout` elapses first.
    ///
    /// # Errors
    ///
    /// Returns [`RevsightError::Backend`] if the program cannot be started,
    /// exits unsuccessfully, or times out.
    pub(crate) async fn run(self, timeout: Option<Duration>) -> Result<String, RevsightError> {
        let display = self.display();
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    RevsightError::Backend(format!(
                        "`{display}` timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => cmd.output().await,
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RevsightError::Backend(format!("{} is not installed or not on PATH", self.program))
            } else {
                RevsightError::Backend(format!("failed to run `{display}`: {e}"))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RevsightError::Backend(format!(
                "`{display}` failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Number of lines in `content`; a final line without a newline still counts.
pub(crate) fn count_lines(content: &[u8]) -> u32 {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    let unterminated = usize::from(content.last().is_some_and(|&b| b != b'\n'));
    u32::try_from(newlines + unterminated).unwrap_or(u32::MAX)
}
