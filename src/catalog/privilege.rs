use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use zbus::blocking::Connection;

use crate::types::CommandResult;

/// D-Bus coordinates of the privileged helper service.
pub const HELPER_SERVICE: &str = "nl.root3.support.helper";
pub const HELPER_PATH: &str = "/nl/root3/support/helper";
pub const HELPER_INTERFACE: &str = "nl.root3.support.Helper";
const HELPER_METHOD: &str = "ExecuteScript";

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("failed to connect to privileged helper: {0}")]
    Connect(String),
    #[error("privileged call failed: {0}")]
    Call(String),
    #[error("failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },
    #[error("privileged call did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Runs a pre-built command string with elevated privilege.
///
/// Implementations run exactly what they are given. Callers build the command
/// through [`crate::catalog::commands`] so nothing untrusted is interpolated.
pub trait PrivilegedExecutor: Send + Sync {
    fn execute(&self, command: &str) -> Result<CommandResult, ExecuteError>;
}

/// Client for the helper daemon registered on the system bus.
#[derive(Clone, Debug)]
pub struct DbusHelperExecutor {
    service: String,
    path: String,
    interface: String,
}

impl DbusHelperExecutor {
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            interface: interface.into(),
        }
    }
}

impl Default for DbusHelperExecutor {
    fn default() -> Self {
        Self::new(HELPER_SERVICE, HELPER_PATH, HELPER_INTERFACE)
    }
}

impl PrivilegedExecutor for DbusHelperExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult, ExecuteError> {
        // The connection is local to this call and closes when it goes out of scope.
        let connection = Connection::system().map_err(|err| {
            ExecuteError::Connect(format!("system bus unavailable: {}", err))
        })?;

        let reply = connection
            .call_method(
                Some(self.service.as_str()),
                self.path.as_str(),
                Some(self.interface.as_str()),
                HELPER_METHOD,
                &(command,),
            )
            .map_err(|err| match err {
                zbus::Error::MethodError(ref name, _, _)
                    if is_unreachable_error(name.as_str()) =>
                {
                    ExecuteError::Connect(err.to_string())
                }
                other => ExecuteError::Call(other.to_string()),
            })?;

        let body = reply.body();
        let code = body
            .deserialize::<i32>()
            .map_err(|err| ExecuteError::Call(format!("Failed to parse response: {}", err)))?;

        log::debug!(target: "catalog", "{} returned exit code {}", self.service, code);
        Ok(CommandResult::from_code(code))
    }
}

fn is_unreachable_error(name: &str) -> bool {
    matches!(
        name,
        "org.freedesktop.DBus.Error.ServiceUnknown"
            | "org.freedesktop.DBus.Error.NameHasNoOwner"
            | "org.freedesktop.DBus.Error.AccessDenied"
            | "org.freedesktop.DBus.Error.Spawn.ServiceNotFound"
            | "org.freedesktop.DBus.Error.Spawn.ExecFailed"
    )
}

/// Fallback that asks polkit to run the command directly.
#[derive(Clone, Debug, Default)]
pub struct PkexecExecutor;

impl PrivilegedExecutor for PkexecExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult, ExecuteError> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(ExecuteError::Launch {
                program: "pkexec".to_string(),
                reason: "empty command".to_string(),
            });
        };
        let args: Vec<&str> = parts.collect();
        run_privileged_command(program, &args)
    }
}

pub(crate) fn run_privileged_command(
    program: &str,
    args: &[&str],
) -> Result<CommandResult, ExecuteError> {
    let output = Command::new("pkexec")
        .arg(program)
        .args(args)
        .output()
        .map_err(|err| ExecuteError::Launch {
            program: "pkexec".to_string(),
            reason: err.to_string(),
        })?;

    Ok(CommandResult {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Tracks whether a privileged call is still running on its call thread.
///
/// The slot outlives the caller's deadline: it is freed only when the
/// executor itself returns, so a timed-out call still blocks the next one.
#[derive(Clone, Debug, Default)]
pub struct CallSlot(Arc<AtomicBool>);

impl CallSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Claims the slot, or returns `None` while a call is still running.
    pub fn try_acquire(&self) -> Option<CallGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CallGuard(self.0.clone()))
    }
}

/// Frees its [`CallSlot`] when dropped.
#[derive(Debug)]
pub struct CallGuard(Arc<AtomicBool>);

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs `command` on its own thread and waits at most `timeout` for the result.
///
/// On expiry the call thread is abandoned but keeps `guard` until the helper
/// answers.
pub fn execute_with_deadline(
    executor: Arc<dyn PrivilegedExecutor>,
    command: &str,
    timeout: Duration,
    guard: Option<CallGuard>,
) -> Result<CommandResult, ExecuteError> {
    let (tx, rx) = mpsc::channel();
    let command_owned = command.to_string();

    thread::spawn(move || {
        let result = executor.execute(&command_owned);
        // Free the slot before the result can reach the controller.
        drop(guard);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            log::error!(target: "catalog", "Privileged call timed out after {:?}", timeout);
            Err(ExecuteError::TimedOut(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExecuteError::Call(
            "Internal error: channel disconnected".to_string(),
        )),
    }
}
