use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::catalog::{
    AUTHORIZATION_KEY, CallSlot, CheckError, CheckJob, Installation, PreferenceStore, PrivilegedExecutor,
    UPDATE_COUNT_KEY, UPDATE_DETAILS_KEY, UpdateSnapshot, check_updates_command,
    run_privileged_action, run_update_check, update_app_command,
};
use crate::settings::AppSettings;
use crate::state::types::{CatalogMessage, CatalogState};
use crate::types::{CommandResult, UpdateItem};

type Listener = Rc<dyn Fn(&CatalogState)>;

/// Owns the published catalog state on the foreground thread.
///
/// Workers never touch the state; they report back through `sender`, and
/// whatever drains the receiver hands each message to [`Self::handle_message`].
pub struct CatalogController {
    state: RefCell<CatalogState>,
    sender: mpsc::Sender<CatalogMessage>,
    executor: Arc<dyn PrivilegedExecutor>,
    config: Arc<dyn PreferenceStore>,
    results: Arc<dyn PreferenceStore>,
    installation: Installation,
    cli_path: PathBuf,
    call_timeout: Duration,
    // Busy until the executor returns, which may be after the worker gave up.
    check_slot: CallSlot,
    app_slots: RefCell<HashMap<String, CallSlot>>,
    listeners: RefCell<Vec<Listener>>,
}

impl CatalogController {
    pub fn new(
        settings: &AppSettings,
        executor: Arc<dyn PrivilegedExecutor>,
        config: Arc<dyn PreferenceStore>,
        results: Arc<dyn PreferenceStore>,
        sender: mpsc::Sender<CatalogMessage>,
    ) -> Self {
        let state = CatalogState {
            catalog_authorization: config.string(AUTHORIZATION_KEY).unwrap_or_default(),
            app_updates: config.integer(UPDATE_COUNT_KEY).unwrap_or(0),
            show_app_updates: settings.show_app_updates,
            ..Default::default()
        };

        Self {
            state: RefCell::new(state),
            sender,
            executor,
            config,
            results,
            installation: settings.installation(),
            cli_path: settings.cli_path.clone(),
            call_timeout: settings.call_timeout(),
            check_slot: CallSlot::new(),
            app_slots: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Builds a controller against the configured executor and preference suite.
    pub fn from_settings(settings: &AppSettings, sender: mpsc::Sender<CatalogMessage>) -> Self {
        let preferences: Arc<dyn PreferenceStore> = Arc::new(settings.preferences());
        Self::new(
            settings,
            settings.build_executor(),
            preferences.clone(),
            preferences,
            sender,
        )
    }

    pub fn connect_changed<F: Fn(&CatalogState) + 'static>(&self, callback: F) {
        self.listeners.borrow_mut().push(Rc::new(callback));
    }

    fn notify_changed(&self) {
        let snapshot = self.state.borrow().clone();
        // Listeners may register more listeners while being notified.
        let listeners = self.listeners.borrow().clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn update_details(&self) -> Vec<UpdateItem> {
        self.state.borrow().update_details.clone()
    }

    pub fn app_updates(&self) -> i64 {
        self.state.borrow().app_updates
    }

    pub fn is_checking(&self) -> bool {
        self.state.borrow().updates_loading
    }

    pub fn show_app_updates(&self) -> bool {
        self.state.borrow().show_app_updates
    }

    pub fn set_show_app_updates(&self, visible: bool) {
        {
            let mut state = self.state.borrow_mut();
            if state.show_app_updates == visible {
                return;
            }
            state.show_app_updates = visible;
        }
        self.notify_changed();
    }

    /// Re-reads the authorization token written by the catalog tool.
    pub fn reload_config(&self) {
        let token = self.config.string(AUTHORIZATION_KEY).unwrap_or_default();
        let changed = {
            let mut state = self.state.borrow_mut();
            let changed = state.catalog_authorization != token;
            state.catalog_authorization = token;
            changed
        };
        if changed {
            self.notify_changed();
        }
    }

    pub fn catalog_installed(&self) -> bool {
        let state = self.state.borrow();
        self.installation.is_installed(&state.catalog_authorization)
    }

    fn job(&self, command: String) -> CheckJob {
        CheckJob {
            executor: self.executor.clone(),
            config: self.config.clone(),
            results: self.results.clone(),
            command,
            details_key: UPDATE_DETAILS_KEY.to_string(),
            count_key: UPDATE_COUNT_KEY.to_string(),
            timeout: self.call_timeout,
        }
    }

    /// Starts a background check unless one is already running.
    ///
    /// Returns whether a worker was spawned.
    pub fn check_updates(&self) -> bool {
        self.reload_config();

        if self.state.borrow().updates_loading {
            log::debug!(target: "catalog", "Update check already in progress");
            return false;
        }
        if !self.catalog_installed() {
            log::info!(target: "catalog", "App Catalog is not installed or not authorized");
            return false;
        }

        let command = match check_updates_command(&self.cli_path) {
            Ok(command) => command,
            Err(err) => {
                log::error!(target: "catalog", "Failed to build check command: {}", err);
                return false;
            }
        };

        let Some(guard) = self.check_slot.try_acquire() else {
            log::warn!(target: "catalog", "Previous update check is still running in the helper");
            return false;
        };

        self.state.borrow_mut().updates_loading = true;
        self.notify_changed();

        let job = self.job(command);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = run_update_check(&job, Some(guard));
            let _ = sender.send(CatalogMessage::UpdatesChecked { result });
        });

        true
    }

    /// Asks the catalog tool to update one application.
    pub fn update_app(&self, id: &str) -> bool {
        if !self.catalog_installed() {
            log::info!(target: "catalog", "App Catalog is not installed or not authorized");
            return false;
        }

        let command = match update_app_command(&self.cli_path, id) {
            Ok(command) => command,
            Err(err) => {
                log::error!(target: "catalog", "Refusing to update app: {}", err);
                return false;
            }
        };

        if self.state.borrow().is_updating(id) {
            log::debug!(target: "catalog", "{} is already updating", id);
            return false;
        }
        let guard = {
            let mut slots = self.app_slots.borrow_mut();
            slots.entry(id.to_string()).or_default().try_acquire()
        };
        let Some(guard) = guard else {
            log::warn!(
                target: "catalog",
                "Previous update of {} is still running in the helper",
                id
            );
            return false;
        };

        self.state.borrow_mut().apps_updating.insert(id.to_string());
        self.notify_changed();

        log::info!(target: "catalog", "Updating {}...", id);
        let executor = self.executor.clone();
        let timeout = self.call_timeout;
        let sender = self.sender.clone();
        let id = id.to_string();
        thread::spawn(move || {
            let result = run_privileged_action(executor, &command, timeout, Some(guard));
            let _ = sender.send(CatalogMessage::AppUpdateFinished { id, result });
        });

        true
    }

    pub fn handle_message(&self, msg: CatalogMessage) {
        match msg {
            CatalogMessage::UpdatesChecked { result } => self.finish_updates_check(result),
            CatalogMessage::AppUpdateFinished { id, result } => self.finish_app_update(id, result),
        }
    }

    fn finish_updates_check(&self, result: Result<UpdateSnapshot, CheckError>) {
        {
            let mut state = self.state.borrow_mut();
            state.updates_loading = false;
            match result {
                Ok(snapshot) => {
                    state.update_details = snapshot.items;
                    state.app_updates = snapshot.pending;
                    state.last_update_check = Some(Utc::now());
                }
                Err(err) => {
                    log::warn!(
                        target: "catalog",
                        "Keeping {} previously published updates: {}",
                        state.update_details.len(),
                        err
                    );
                }
            }
        }
        self.notify_changed();
    }

    fn finish_app_update(&self, id: String, result: Result<CommandResult, CheckError>) {
        self.state.borrow_mut().apps_updating.remove(&id);
        self.notify_changed();

        match result {
            Ok(_) => {
                log::info!(target: "catalog", "Successfully updated {}", id);
                self.check_updates();
            }
            Err(err) => log::error!(target: "catalog", "Failed to update {}: {}", id, err),
        }
    }
}
