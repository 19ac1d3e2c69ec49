use serde::Serialize;
use std::fmt;

/// Error envelope returned to the frontend. `code` distinguishes bad input
/// (`ERR_VALIDATION`), a missing external tool (`ERR_DEPENDENCY`), and a failed
/// or unrunnable command (`ERR_SYSTEM`).
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_VALIDATION", message, trace_id)
    }

    pub fn dependency(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_DEPENDENCY", message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_SYSTEM", message, trace_id)
    }

    /// Wraps a non-zero exit from an external tool, keeping the captured stderr
    /// verbatim so the caller sees exactly what the tool reported.
    pub fn command_failed(
        program: &str,
        stderr: &str,
        exit_code: Option<i32>,
        trace_id: impl Into<String>,
    ) -> Self {
        let detail = if stderr.trim().is_empty() {
            match exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            stderr.trim().to_string()
        };
        Self::system(format!("{program} failed: {detail}"), trace_id)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_keeps_stderr_text() {
        let err = AppError::command_failed(
            "fastboot",
            "FAILED (remote: unknown partition)\n",
            Some(1),
            "t",
        );
        assert_eq!(err.code, "ERR_SYSTEM");
        assert!(err.error.contains("FAILED (remote: unknown partition)"));
    }

    #[test]
    fn command_failed_without_stderr_reports_exit_code() {
        let err = AppError::command_failed("adb", "", Some(127), "t");
        assert!(err.error.contains("exit code 127"));
    }
}
