// ABOUTME: Owns the ssh child process: spawn, settle, liveness, and termination.
// ABOUTME: Liveness combines the process table with a signal-0 probe on the pid.

use super::command::SshCommand;
use crate::error::{Error, Result};
use serde::Serialize;
use std::io::Read;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, ExitStatus};
use std::time::Duration;

/// Point-in-time view of the supervised process. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessStatus {
    pub pid: u32,
    pub running: bool,
    /// `Some(0)` whenever the pid answers the liveness probe.
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Terminated,
}

/// The child plus the pipes we hold open for its lifetime.
struct Handle {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl Handle {
    fn new(mut child: Child) -> Self {
        Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            child,
        }
    }

    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn close_pipes(&mut self) {
        drop(self.stdin.take());
        drop(self.stdout.take());
        drop(self.stderr.take());
    }

    /// Read whatever the process left in stdout and stderr, then close all pipes.
    fn drain(&mut self) -> (String, String) {
        drop(self.stdin.take());
        let stdout = read_pipe(self.stdout.take());
        let stderr = read_pipe(self.stderr.take());
        (stdout, stderr)
    }

    fn reap(&mut self) -> Option<ExitStatus> {
        match self.child.wait() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!(pid = self.pid(), "failed to reap ssh process: {}", e);
                None
            }
        }
    }

    /// Close pipes, then SIGTERM and SIGKILL back to back, then reap.
    fn shutdown(mut self) {
        let pid = self.pid();
        self.close_pipes();

        // Once reaped the pid may belong to someone else.
        let reaped = matches!(self.child.try_wait(), Ok(Some(_)));
        if !reaped {
            send_signal(pid, libc::SIGTERM);
            send_signal(pid, libc::SIGKILL);
        }

        self.reap();
        tracing::info!(pid, "ssh tunnel process terminated");
    }
}

enum SupervisorState {
    Idle,
    Running(Handle),
    Terminated,
}

/// Supervises at most one ssh process.
pub struct ProcessSupervisor {
    state: SupervisorState,
    settle_delay: Duration,
}

impl ProcessSupervisor {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            state: SupervisorState::Idle,
            settle_delay,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            SupervisorState::Idle => Lifecycle::Idle,
            SupervisorState::Running(_) => Lifecycle::Running,
            SupervisorState::Terminated => Lifecycle::Terminated,
        }
    }

    /// Spawn `command`, wait the settle delay, and confirm it is still alive.
    ///
    /// There is no readiness signal from ssh, so surviving the settle delay is
    /// taken as success. On failure the captured stdout/stderr are returned in
    /// [`Error::TunnelEstablishment`] and the process is reaped.
    pub fn spawn(&mut self, command: &SshCommand) -> Result<ProcessStatus> {
        if let Some(status) = self.status() {
            if status.running {
                return Err(Error::AlreadyRunning { pid: status.pid });
            }
            tracing::debug!(pid = status.pid, "discarding exited ssh process");
            self.terminate();
        }

        let child = command.to_command().spawn().map_err(|source| Error::Spawn {
            program: command.program().display().to_string(),
            source,
        })?;
        let pid = child.id();
        tracing::debug!(pid, "spawned {}", command);

        self.state = SupervisorState::Running(Handle::new(child));

        std::thread::sleep(self.settle_delay);

        match self.status() {
            Some(status) if status.running => {
                tracing::debug!(pid, "ssh survived settle delay");
                Ok(status)
            }
            _ => Err(self.fail_establishment()),
        }
    }

    fn fail_establishment(&mut self) -> Error {
        let state = std::mem::replace(&mut self.state, SupervisorState::Idle);
        let SupervisorState::Running(mut handle) = state else {
            return Error::TunnelEstablishment {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
            };
        };

        let (stdout, stderr) = handle.drain();
        let exit_code = handle.reap().and_then(exit_code);

        tracing::debug!(pid = handle.pid(), ?exit_code, "ssh exited during settle delay");

        Error::TunnelEstablishment {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Current status, or `None` when no process is held.
    pub fn status(&mut self) -> Option<ProcessStatus> {
        let SupervisorState::Running(handle) = &mut self.state else {
            return None;
        };
        let pid = handle.pid();

        let mut status = match handle.child.try_wait() {
            Ok(None) => ProcessStatus {
                pid,
                running: true,
                exit_code: None,
            },
            Ok(Some(exit)) => ProcessStatus {
                pid,
                running: false,
                exit_code: exit_code(exit),
            },
            Err(e) => {
                tracing::debug!(pid, "process table lookup failed: {}", e);
                ProcessStatus {
                    pid,
                    running: false,
                    exit_code: None,
                }
            }
        };

        // The probe wins over the table.
        if probe(pid) {
            if !status.running {
                tracing::warn!(pid, "process table reports exit but pid still answers signal 0");
            }
            status.running = true;
            status.exit_code = Some(0);
        }

        Some(status)
    }

    /// Tear the process down. No-op when nothing is held; never fails.
    pub fn terminate(&mut self) {
        match std::mem::replace(&mut self.state, SupervisorState::Terminated) {
            SupervisorState::Running(handle) => handle.shutdown(),
            other => self.state = other,
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn exit_code(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().or_else(|| status.signal().map(|sig| 128 + sig))
    }
    #[cfg(not(unix))]
    {
        status.code()
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf) {
        tracing::debug!("failed to read ssh output: {}", e);
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

/// Zero-effect liveness probe: `kill(pid, 0)`.
fn probe(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs permission and existence checks only.
    unsafe { libc::kill(pid, 0) == 0 }
}

fn send_signal(pid: u32, signal: libc::c_int) {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: plain kill(2) on a pid we spawned and have not yet reaped.
    let rc = unsafe { libc::kill(raw, signal) };
    if rc != 0 {
        tracing::debug!(
            pid,
            signal,
            "kill failed: {}",
            std::io::Error::last_os_error()
        );
    }
}
