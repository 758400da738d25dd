use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::types::{CommandResult, UpdateItem};

use super::decode::{DecodeError, read_updates};
use super::preferences::PreferenceStore;
use super::privilege::{CallGuard, ExecuteError, PrivilegedExecutor, execute_with_deadline};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Connect(#[from] ExecuteError),
    #[error("privileged command exited with {}", describe_code(.code))]
    Execution { code: Option<i32> },
    #[error("failed to decode app updates: {0}")]
    Decode(#[from] DecodeError),
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Result of one successful check, ready to be published.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateSnapshot {
    pub items: Vec<UpdateItem>,
    pub pending: i64,
}

/// Everything a worker needs for one check; cheap to clone into a thread.
#[derive(Clone)]
pub struct CheckJob {
    pub executor: Arc<dyn PrivilegedExecutor>,
    pub config: Arc<dyn PreferenceStore>,
    pub results: Arc<dyn PreferenceStore>,
    pub command: String,
    pub details_key: String,
    pub count_key: String,
    pub timeout: Duration,
}

/// Runs a privileged command and maps anything but exit code 0 to an error.
///
/// `guard` is held by the call thread until the executor returns, even past
/// the deadline.
pub fn run_privileged_action(
    executor: Arc<dyn PrivilegedExecutor>,
    command: &str,
    timeout: Duration,
    guard: Option<CallGuard>,
) -> Result<CommandResult, CheckError> {
    let result = execute_with_deadline(executor, command, timeout, guard)?;
    if !result.success() {
        if let Some(line) = first_line(&result.stderr) {
            log::debug!(target: "catalog", "stderr: {}", line);
        }
        return Err(CheckError::Execution { code: result.code });
    }
    Ok(result)
}

/// Runs the check command, then reads the cache only if it exited cleanly.
pub fn run_update_check(
    job: &CheckJob,
    guard: Option<CallGuard>,
) -> Result<UpdateSnapshot, CheckError> {
    log::info!(target: "catalog", "Checking app updates...");

    match run_privileged_action(job.executor.clone(), &job.command, job.timeout, guard) {
        Ok(_) => log::info!(target: "catalog", "Successfully checked app updates"),
        Err(err) => {
            log::error!(target: "catalog", "Failed to check app updates: {}", err);
            return Err(err);
        }
    }

    let items = match read_updates(job.results.as_ref(), &job.details_key) {
        Ok(items) => items,
        Err(err) => {
            log::error!(target: "catalog", "Failed to decode app updates: {}", err);
            return Err(err.into());
        }
    };
    log::debug!(target: "catalog", "Successfully decoded {} app updates", items.len());

    let pending = job
        .config
        .integer(&job.count_key)
        .unwrap_or(items.len() as i64);

    Ok(UpdateSnapshot { items, pending })
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::preferences::{MemoryPreferences, PreferenceError};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FakeExecutor {
        pub(crate) outcome: Mutex<Option<Result<CommandResult, ExecuteError>>>,
        pub(crate) commands: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        pub(crate) fn exiting(code: i32) -> Self {
            Self::with(Ok(CommandResult::from_code(code)))
        }

        pub(crate) fn unreachable() -> Self {
            Self::with(Err(ExecuteError::Connect("service not registered".to_string())))
        }

        fn with(outcome: Result<CommandResult, ExecuteError>) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
                commands: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl PrivilegedExecutor for FakeExecutor {
        fn execute(&self, command: &str) -> Result<CommandResult, ExecuteError> {
            self.commands.lock().unwrap().push(command.to_string());
            self.outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(CommandResult::from_code(0)))
        }
    }

    /// Counts blob lookups so tests can assert when the cache was read.
    #[derive(Default)]
    pub(crate) struct CountingStore {
        pub(crate) inner: MemoryPreferences,
        pub(crate) data_reads: AtomicUsize,
    }

    impl CountingStore {
        pub(crate) fn reads(&self) -> usize {
            self.data_reads.load(Ordering::SeqCst)
        }
    }

    impl PreferenceStore for CountingStore {
        fn string(&self, key: &str) -> Option<String> {
            self.inner.string(key)
        }

        fn integer(&self, key: &str) -> Option<i64> {
            self.inner.integer(key)
        }

        fn data(&self, key: &str) -> Result<Option<Vec<u8>>, PreferenceError> {
            self.data_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.data(key)
        }
    }

    pub(crate) fn one_item_blob() -> serde_json::Value {
        json!([{
            "id": "com.google.Chrome",
            "name": "Google Chrome",
            "version": "120.0",
            "newVersion": "121.0"
        }])
        .to_string()
        .into()
    }

    fn job(executor: Arc<FakeExecutor>, results: Arc<CountingStore>) -> CheckJob {
        CheckJob {
            executor,
            config: Arc::new(MemoryPreferences::new()),
            results,
            command: "/usr/local/bin/catalog --check-updates".to_string(),
            details_key: "UpdateDetails".to_string(),
            count_key: "Updates".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn exit_zero_reads_cache_exactly_once() {
        let executor = Arc::new(FakeExecutor::exiting(0));
        let results = Arc::new(CountingStore::default());
        results.inner.set("UpdateDetails", one_item_blob());

        let job = job(executor.clone(), results.clone());
        let snapshot = run_update_check(&job, None).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.pending, 1);
        assert_eq!(results.reads(), 1);
        assert_eq!(
            executor.commands(),
            vec!["/usr/local/bin/catalog --check-updates".to_string()]
        );
    }

    #[test]
    fn connection_failure_skips_cache() {
        let executor = Arc::new(FakeExecutor::unreachable());
        let results = Arc::new(CountingStore::default());
        results.inner.set("UpdateDetails", one_item_blob());

        let err = run_update_check(&job(executor, results.clone()), None).unwrap_err();
        assert!(matches!(err, CheckError::Connect(ExecuteError::Connect(_))));
        assert_eq!(results.reads(), 0);
    }

    #[test]
    fn non_zero_exit_skips_cache() {
        let executor = Arc::new(FakeExecutor::exiting(1));
        let results = Arc::new(CountingStore::default());
        results.inner.set("UpdateDetails", one_item_blob());

        let err = run_update_check(&job(executor, results.clone()), None).unwrap_err();
        assert!(matches!(err, CheckError::Execution { code: Some(1) }));
        assert_eq!(results.reads(), 0);
        assert_eq!(err.to_string(), "privileged command exited with code 1");
    }

    #[test]
    fn missing_blob_after_success_is_decode_error() {
        let executor = Arc::new(FakeExecutor::exiting(0));
        let results = Arc::new(CountingStore::default());

        let err = run_update_check(&job(executor, results.clone()), None).unwrap_err();
        assert!(matches!(err, CheckError::Decode(DecodeError::MissingKey(_))));
        assert_eq!(results.reads(), 1);
    }

    #[test]
    fn stored_count_overrides_list_length() {
        let executor = Arc::new(FakeExecutor::exiting(0));
        let results = Arc::new(CountingStore::default());
        results.inner.set("UpdateDetails", one_item_blob());
        let config = MemoryPreferences::new();
        config.set("Updates", json!(4));

        let mut job = job(executor, results);
        job.config = Arc::new(config);
        assert_eq!(run_update_check(&job, None).unwrap().pending, 4);
    }
}
