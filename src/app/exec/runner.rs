use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::app::error::AppError;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code.unwrap_or_default() == 0
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(windows)]
fn configure_window_mode(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    // CREATE_NO_WINDOW keeps the tool from flashing a console next to the GUI.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_window_mode(_cmd: &mut Command) {}

fn drain_reader(mut reader: impl Read) -> Vec<u8> {
    let mut buffer = Vec::<u8>::new();
    let mut temp = [0u8; 4096];
    loop {
        match reader.read(&mut temp) {
            Ok(0) => break,
            Ok(count) => buffer.extend_from_slice(&temp[..count]),
            Err(_) => break,
        }
    }
    buffer
}

pub fn run_tool(
    program: &str,
    args: &[String],
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    run_tool_with_timeout(program, args, DEFAULT_TIMEOUT, trace_id)
}

pub fn run_tool_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    configure_window_mode(&mut cmd);

    let mut child = cmd
        .spawn()
        .map_err(|err| AppError::system(format!("Failed to spawn {program}: {err}"), trace_id))?;

    // Drain stdout/stderr in parallel; otherwise, a chatty child process can block once the pipe
    // buffer fills, and we will incorrectly hit the timeout.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stderr", trace_id))?;

    let stdout_handle = std::thread::spawn(move || drain_reader(stdout));
    let stderr_handle = std::thread::spawn(move || drain_reader(stderr));

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_handle.join();
                    let _ = stderr_handle.join();
                    return Err(AppError::system(
                        format!("{program} timed out after {}s", timeout.as_secs()),
                        trace_id,
                    ));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(AppError::system(
                    format!("Failed to poll {program}: {err}"),
                    trace_id,
                ));
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}

/// Single-shot invocation with the wrapper contract used by every device
/// operation: trimmed stdout on success, the captured stderr wrapped into the
/// error on a non-zero exit. No retries.
pub fn run_checked(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<String, AppError> {
    let output = run_tool_with_timeout(program, args, timeout, trace_id)?;
    if !output.success() {
        return Err(AppError::command_failed(
            program,
            &output.stderr,
            output.exit_code,
            trace_id,
        ));
    }
    Ok(output.stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(unix_script: &str, windows_script: &str) -> (String, Vec<String>) {
        if cfg!(windows) {
            (
                "cmd.exe".to_string(),
                vec!["/C".to_string(), windows_script.to_string()],
            )
        } else {
            (
                "sh".to_string(),
                vec!["-c".to_string(), unix_script.to_string()],
            )
        }
    }

    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        let (program, args) = shell(
            "echo out; echo err 1>&2; exit 3",
            "echo out & echo err 1>&2 & exit /b 3",
        );
        let output = run_tool(&program, &args, "trace-capture").expect("run");
        assert_eq!(output.exit_code, Some(3));
        assert!(output.stdout.contains("out"));
        assert!(output.stderr.contains("err"));
        assert!(!output.success());
    }

    #[test]
    fn run_checked_returns_trimmed_stdout() {
        let (program, args) = shell("echo hello", "echo hello");
        let stdout = run_checked(&program, &args, DEFAULT_TIMEOUT, "trace-trim").expect("run");
        assert_eq!(stdout, "hello");
    }

    #[test]
    fn run_checked_wraps_stderr_on_failure() {
        let (program, args) = shell("echo boom 1>&2; exit 1", "echo boom 1>&2 & exit /b 1");
        let err = run_checked(&program, &args, DEFAULT_TIMEOUT, "trace-fail")
            .expect_err("expected failure");
        assert_eq!(err.code, "ERR_SYSTEM");
        assert!(err.error.contains("boom"));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = run_tool("adbkit-no-such-tool", &[], "trace-missing").expect_err("spawn");
        assert_eq!(err.code, "ERR_SYSTEM");
        assert!(err.error.contains("Failed to spawn"));
    }

    #[test]
    fn does_not_deadlock_on_large_stdout() {
        // Regression test: If stdout/stderr are piped but not drained, the child can block once
        // the pipe buffer fills, causing an otherwise-fast command to "hang" until we hit the
        // timeout.
        let (program, args) = if cfg!(windows) {
            (
                "cmd.exe".to_string(),
                vec![
                    "/C".to_string(),
                    "for /L %i in (1,1,100000) do @echo 1234567890".to_string(),
                ],
            )
        } else {
            (
                "sh".to_string(),
                vec![
                    "-c".to_string(),
                    "i=0; while [ $i -lt 100000 ]; do echo 1234567890; i=$((i+1)); done"
                        .to_string(),
                ],
            )
        };

        let output =
            run_tool_with_timeout(&program, &args, Duration::from_secs(10), "trace-large")
                .expect("expected large-output command to complete without timing out");

        assert_eq!(output.exit_code, Some(0));
        assert!(output.stdout.len() >= 1_000_000);
    }
}
