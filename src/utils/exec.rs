//! External command execution.
//!
//! Async builder over `tokio::process` so the style actor's worker tasks can
//! wait on the generator without blocking a runtime thread.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! Cmd::from_slice(&["npx", "unocss"])
//!     .args(["tokens.txt", "-o", "out.css"])
//!     .cwd(root)
//!     .run()
//!     .await?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Output, Stdio},
    sync::OnceLock,
};
use tokio::process::Command;

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Default, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    quiet: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["unocss"]` or `["npx", "unocss"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Don't echo stderr of successful runs.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command and return output. Non-zero exit is an error.
    pub async fn run(self) -> Result<Output> {
        let name = self.program_name();
        if name.is_empty() {
            anyhow::bail!("empty command");
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !output.status.success() {
            anyhow::bail!(format_error(&name, &output));
        }

        if !self.quiet {
            log_lines(&name, &String::from_utf8_lossy(&output.stderr));
        }
        Ok(output)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));
    re.replace_all(s, "")
}

/// Log non-empty output lines under the program's prefix.
fn log_lines(name: &str, output: &str) {
    let lines: Vec<_> = output
        .lines()
        .map(strip_ansi)
        .filter(|line| !line.trim().is_empty())
        .collect();

    if !lines.is_empty() {
        log!(name; "{}", lines.join("\n"));
    }
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}\n", output.status);
    msg.push_str(&strip_ansi(stderr.trim()));

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::from_slice(&["npx", "unocss"])
            .arg("tokens.txt")
            .args(["-o", "out.css"])
            .cwd("/tmp");

        assert_eq!(cmd.program, OsString::from("npx"));
        assert_eq!(cmd.args.len(), 4);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_empty_args_filtered() {
        let cmd = Cmd::new("echo").arg("").args(["a", "", "b"]);
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_simple_command() {
        let output = Cmd::new("echo").arg("hello").quiet(true).run().await.unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_is_error() {
        let err = Cmd::from_slice(&["sh", "-c", "echo boom >&2; exit 3"])
            .run()
            .await
            .unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("`sh` failed"));
        assert!(msg.contains("boom"));
    }

    #[tokio::test]
    async fn test_empty_command_is_error() {
        let empty: [&str; 0] = [];
        assert!(Cmd::from_slice(&empty).run().await.is_err());
    }
}
