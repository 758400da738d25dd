use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::catalog::{CheckError, UpdateSnapshot};
use crate::types::{CommandResult, UpdateItem};

/// Published catalog state. Only the foreground controller writes it.
#[derive(Clone, Debug, Default)]
pub struct CatalogState {
    pub catalog_authorization: String,
    pub app_updates: i64,
    pub apps_updating: BTreeSet<String>,
    pub show_app_updates: bool,
    pub update_details: Vec<UpdateItem>,
    pub updates_loading: bool,
    pub last_update_check: Option<DateTime<Utc>>,
}

impl CatalogState {
    pub fn is_updating(&self, id: &str) -> bool {
        self.apps_updating.contains(id)
    }
}

/// Results sent from worker threads back to the foreground context.
#[derive(Debug)]
pub enum CatalogMessage {
    UpdatesChecked {
        result: Result<UpdateSnapshot, CheckError>,
    },
    AppUpdateFinished {
        id: String,
        result: Result<CommandResult, CheckError>,
    },
}
