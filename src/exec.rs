//! Running external tools, optionally elevated through `pkexec`.
//!
//! Every command runs with `LC_ALL=C` so the parsers in `system` only ever
//! see untranslated output.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ControlError, Result};

const PKEXEC: &str = "pkexec";
const PKEXEC_DISMISSED: i32 = 126;
const PKEXEC_NOT_AUTHORIZED: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(line) | OutputLine::Stderr(line) => line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    privileged: bool,
    env: Vec<(String, String)>,
    stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run as root via polkit.
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Full argument vector as it is handed to the OS.
    ///
    /// pkexec clears the environment, so elevated commands carry their
    /// variables through `env`.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 4);
        if self.privileged {
            argv.push(PKEXEC.to_string());
            argv.push("env".to_string());
            argv.push("LC_ALL=C".to_string());
            for (key, value) in &self.env {
                argv.push(format!("{}={}", key, value));
            }
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Command line for logs and error messages, without the pkexec wrapper.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let argv = self.argv();
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        command.env("LC_ALL", "C");
        if !self.privileged {
            for (key, value) in &self.env {
                command.env(key, value);
            }
        }
        command.kill_on_drop(true);
        command
    }

    fn spawn_error(&self, err: std::io::Error) -> ControlError {
        if err.kind() == std::io::ErrorKind::NotFound {
            let program = if self.privileged { PKEXEC } else { &self.program };
            ControlError::ToolMissing {
                program: program.to_string(),
            }
        } else {
            ControlError::Io(err)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    fn into_checked(self, spec: &CommandSpec) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(self.into_failure(spec))
        }
    }

    fn into_failure(self, spec: &CommandSpec) -> ControlError {
        let code = self.status_code.unwrap_or(-1);
        if spec.privileged && (code == PKEXEC_DISMISSED || code == PKEXEC_NOT_AUTHORIZED) {
            return ControlError::AuthorizationDenied;
        }
        ControlError::CommandFailed {
            command: spec.display(),
            code,
            stderr: self.stderr,
        }
    }
}

/// Runs to completion and captures both streams. A non-zero exit is not an error here.
pub async fn run(spec: &CommandSpec) -> Result<CommandOutput> {
    debug!(command = %spec.display(), privileged = spec.privileged, "running command");
    let mut command = spec.to_command();
    command
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| spec.spawn_error(e))?;
    if let (Some(input), Some(mut stdin)) = (&spec.stdin, child.stdin.take()) {
        stdin.write_all(input.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    Ok(CommandOutput {
        status_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Like [`run`], but turns a failed exit status into an error and returns stdout.
pub async fn run_checked(spec: &CommandSpec) -> Result<String> {
    let output = run(spec).await?;
    if !output.success() {
        warn!(command = %spec.display(), code = ?output.status_code, "command failed");
    }
    output.into_checked(spec)
}

/// Trimmed stdout of a successful command, `None` on any failure.
pub async fn probe(program: &str, args: &[&str]) -> Option<String> {
    let spec = CommandSpec::new(program).args(args.iter().copied());
    match run(&spec).await {
        Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
        _ => None,
    }
}

/// Spawns the command and hands every output line to `on_line` as it arrives.
pub async fn stream<F>(spec: &CommandSpec, mut on_line: F) -> Result<CommandOutput>
where
    F: FnMut(OutputLine),
{
    debug!(command = %spec.display(), privileged = spec.privileged, "streaming command");
    let mut command = spec.to_command();
    command
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| spec.spawn_error(e))?;
    if let (Some(input), Some(mut stdin)) = (&spec.stdin, child.stdin.take()) {
        stdin.write_all(input.as_bytes()).await?;
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ControlError::parse("command output", "stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ControlError::parse("command output", "stderr was not captured"))?;

    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();
    let mut output = CommandOutput::default();
    let (mut out_done, mut err_done) = (false, false);

    while !(out_done && err_done) {
        tokio::select! {
            line = out_lines.next_line(), if !out_done => match line? {
                Some(line) => {
                    output.stdout.push_str(&line);
                    output.stdout.push('\n');
                    on_line(OutputLine::Stdout(line));
                }
                None => out_done = true,
            },
            line = err_lines.next_line(), if !err_done => match line? {
                Some(line) => {
                    output.stderr.push_str(&line);
                    output.stderr.push('\n');
                    on_line(OutputLine::Stderr(line));
                }
                None => err_done = true,
            },
        }
    }

    let status = child.wait().await?;
    output.status_code = status.code();
    debug!(command = %spec.display(), code = ?output.status_code, "command finished");
    Ok(output)
}

/// Streams and fails on a non-zero exit.
pub async fn stream_checked<F>(spec: &CommandSpec, on_line: F) -> Result<CommandOutput>
where
    F: FnMut(OutputLine),
{
    let output = stream(spec, on_line).await?;
    if output.success() {
        Ok(output)
    } else {
        Err(output.into_failure(spec))
    }
}

/// Starts a graphical tool and forgets about it.
pub fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    debug!(program, ?args, "launching application");
    std::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| CommandSpec::new(program).spawn_error(e))
}

pub fn which(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_argv_goes_through_pkexec_env() {
        let spec = CommandSpec::new("dnf")
            .args(["install", "-y", "vlc"])
            .privileged();
        assert_eq!(
            spec.argv(),
            vec!["pkexec", "env", "LC_ALL=C", "dnf", "install", "-y", "vlc"]
        );
        assert_eq!(spec.display(), "dnf install -y vlc");
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec::new("timedatectl").args(["set-time", "2025-01-05 10:00:00"]);
        assert_eq!(spec.display(), "timedatectl set-time \"2025-01-05 10:00:00\"");
    }

    #[test]
    fn pkexec_dismissal_maps_to_authorization_error() {
        let spec = CommandSpec::new("true").privileged();
        let output = CommandOutput {
            status_code: Some(126),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(matches!(
            output.into_checked(&spec),
            Err(ControlError::AuthorizationDenied)
        ));
    }

    #[tokio::test]
    async fn run_captures_stdout_and_stdin() {
        let spec = CommandSpec::new("cat").stdin("alice:secret\n");
        let output = run(&spec).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "alice:secret\n");
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let spec = CommandSpec::new("definitely-not-a-real-tool-4242");
        assert!(matches!(
            run(&spec).await,
            Err(ControlError::ToolMissing { .. })
        ));
    }

    #[tokio::test]
    async fn stream_delivers_lines_from_both_pipes() {
        let spec = CommandSpec::new("sh").args(["-c", "echo one; echo two >&2; echo three"]);
        let mut seen = Vec::new();
        let output = stream(&spec, |line| seen.push(line)).await.unwrap();
        assert!(output.success());
        assert!(seen.contains(&OutputLine::Stdout("one".into())));
        assert!(seen.contains(&OutputLine::Stderr("two".into())));
        assert_eq!(output.stdout, "one\nthree\n");
    }

    #[tokio::test]
    async fn run_checked_reports_exit_code() {
        let spec = CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        match run_checked(&spec).await {
            Err(ControlError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(code, 3);
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
