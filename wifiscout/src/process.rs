//! Bounded execution of external platform tools.
//!
//! Every CLI adapter funnels through [`run`] or [`run_status`], which
//! spawn the tool with piped stdout, poll for completion, and kill the
//! process once the deadline passes. Timeouts here are hard: a wedged
//! tool never blocks the caller past its bound.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Instant;

use log::debug;

use crate::constants::timeouts;
use crate::models::EngineError;
use crate::Result;

/// Runs `program` with `args` and returns its stdout as text.
///
/// Fails with [`EngineError::BackendUnavailable`] when the tool is not
/// installed, [`EngineError::Timeout`] when the deadline passes (the
/// process is killed first), and [`EngineError::OperationFailed`] on a
/// nonzero exit or empty output.
pub(crate) fn run(program: &str, args: &[&str], timeout: std::time::Duration) -> Result<String> {
    let output = capture(program, args, timeout)?;
    if output.trim().is_empty() {
        return Err(EngineError::OperationFailed(format!(
            "{program} produced no output"
        )));
    }
    Ok(output)
}

/// Like [`run`], but for action commands that legitimately print nothing
/// on success (e.g. `networksetup`, `netsh wlan connect`).
pub(crate) fn run_status(
    program: &str,
    args: &[&str],
    timeout: std::time::Duration,
) -> Result<String> {
    capture(program, args, timeout)
}

fn capture(program: &str, args: &[&str], timeout: std::time::Duration) -> Result<String> {
    debug!("running {} {}", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::BackendUnavailable
            } else {
                EngineError::OperationFailed(e.to_string())
            }
        })?;

    // Drain stdout on its own thread while polling: a tool that writes
    // more than the pipe buffer holds would otherwise block and never
    // reach the exit the poll loop is waiting for.
    let reader = child.stdout.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    // Best effort; the process may have exited in between.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EngineError::Timeout);
                }
                std::thread::sleep(timeouts::process_poll_interval());
            }
            Err(e) => {
                let _ = child.kill();
                return Err(EngineError::OperationFailed(e.to_string()));
            }
        }
    };

    let stdout = match reader {
        Some(handle) => handle.join().unwrap_or_default(),
        None => String::new(),
    };

    if !status.success() {
        return Err(EngineError::OperationFailed(format!(
            "{program} exited with {status}"
        )));
    }

    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_tool_is_backend_unavailable() {
        let err = run("definitely-not-a-real-tool-xyz", &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::BackendUnavailable));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_of_successful_command() {
        let out = run("echo", &["hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn empty_output_is_operation_failed() {
        let err = run("true", &[], Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, EngineError::OperationFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn run_status_accepts_empty_output() {
        let out = run_status("true", &[], Duration::from_secs(5)).unwrap();
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_operation_failed() {
        let err = run_status("false", &[], Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, EngineError::OperationFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn output_larger_than_the_pipe_buffer_is_fully_drained() {
        // Exits immediately after printing 200 KB; must come back as
        // output, not as a stalled run.
        let out = run(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' 'x'"],
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes().all(|b| b == b'x'));
    }

    #[cfg(unix)]
    #[test]
    fn hung_process_is_killed_and_times_out() {
        let start = Instant::now();
        let err = run("sleep", &["30"], Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, EngineError::Timeout));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
