mod check;
mod commands;
mod decode;
mod install;
mod preferences;
mod privilege;

pub use check::{CheckError, CheckJob, UpdateSnapshot, run_privileged_action, run_update_check};
pub use commands::{CommandError, check_updates_command, update_app_command};
pub use decode::{DecodeError, decode_updates, is_bundle_identifier, read_updates};
pub use install::{CATALOG_APP_PATH, CATALOG_CLI_PATH, Installation};
pub use preferences::{MemoryPreferences, PreferenceError, PreferenceStore, SuitePreferences};
pub use privilege::{
    CallGuard, CallSlot, DbusHelperExecutor, ExecuteError, HELPER_INTERFACE, HELPER_PATH,
    HELPER_SERVICE, PkexecExecutor, PrivilegedExecutor, execute_with_deadline,
};

#[cfg(test)]
pub(crate) use check::tests as fakes;

/// Preference suite shared with the catalog tool.
pub const CATALOG_SUITE: &str = "nl.root3.catalog";
pub const AUTHORIZATION_KEY: &str = "authorization";
pub const UPDATE_COUNT_KEY: &str = "Updates";
pub const UPDATE_DETAILS_KEY: &str = "UpdateDetails";
