//! Error type shared by the system backends.

use std::io;

pub type Result<T> = std::result::Result<T, ControlError>;

#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{program} is not installed")]
    ToolMissing { program: String },

    #[error("Authentication was cancelled or not authorized")]
    AuthorizationDenied,

    #[error("`{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("{0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl ControlError {
    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        ControlError::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ControlError::Validation(message.into())
    }

    /// Short text for dialog bodies. Command failures show stderr only.
    pub fn user_message(&self) -> String {
        match self {
            ControlError::CommandFailed { stderr, code, .. } if !stderr.trim().is_empty() => {
                format!("{} (exit code {})", stderr.trim(), code)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_message_prefers_stderr() {
        let err = ControlError::CommandFailed {
            command: "dnf install -y foo".into(),
            code: 1,
            stderr: "No match for argument: foo\n".into(),
        };
        assert_eq!(err.user_message(), "No match for argument: foo (exit code 1)");
    }

    #[test]
    fn command_failure_without_stderr_uses_display() {
        let err = ControlError::CommandFailed {
            command: "false".into(),
            code: 1,
            stderr: String::new(),
        };
        assert_eq!(err.user_message(), "`false` failed with exit code 1: ");
    }
}
