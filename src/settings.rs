use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CATALOG_APP_PATH, CATALOG_CLI_PATH, CATALOG_SUITE, DbusHelperExecutor, HELPER_INTERFACE,
    HELPER_PATH, HELPER_SERVICE, Installation, PkexecExecutor, PrivilegedExecutor,
    SuitePreferences,
};

const APP_SETTINGS_FILE: &str = "settings.json";
const DEFAULT_PREFERENCES_DIR: &str = "/var/lib/catalog";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorBackend {
    Dbus,
    Pkexec,
}

impl Default for ExecutorBackend {
    fn default() -> Self {
        ExecutorBackend::Dbus
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub window_width: Option<i32>,
    #[serde(default)]
    pub window_height: Option<i32>,
    #[serde(default)]
    pub executor: ExecutorBackend,
    #[serde(default = "default_helper_service")]
    pub helper_service: String,
    #[serde(default = "default_helper_path")]
    pub helper_path: String,
    #[serde(default = "default_helper_interface")]
    pub helper_interface: String,
    #[serde(default = "default_suite_name")]
    pub suite_name: String,
    #[serde(default = "default_preferences_dir")]
    pub preferences_dir: PathBuf,
    #[serde(default = "default_app_path")]
    pub app_path: PathBuf,
    #[serde(default = "default_cli_path")]
    pub cli_path: PathBuf,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_show_app_updates")]
    pub show_app_updates: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_helper_service() -> String {
    HELPER_SERVICE.to_string()
}

fn default_helper_path() -> String {
    HELPER_PATH.to_string()
}

fn default_helper_interface() -> String {
    HELPER_INTERFACE.to_string()
}

fn default_suite_name() -> String {
    CATALOG_SUITE.to_string()
}

fn default_preferences_dir() -> PathBuf {
    if let Ok(custom) = env::var("SUPPORT_GTK_PREFERENCES_DIR") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_PREFERENCES_DIR)
}

fn default_app_path() -> PathBuf {
    PathBuf::from(CATALOG_APP_PATH)
}

fn default_cli_path() -> PathBuf {
    PathBuf::from(CATALOG_CLI_PATH)
}

fn default_call_timeout_secs() -> u64 {
    300
}

fn default_show_app_updates() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window_width: None,
            window_height: None,
            executor: ExecutorBackend::default(),
            helper_service: default_helper_service(),
            helper_path: default_helper_path(),
            helper_interface: default_helper_interface(),
            suite_name: default_suite_name(),
            preferences_dir: default_preferences_dir(),
            app_path: default_app_path(),
            cli_path: default_cli_path(),
            call_timeout_secs: default_call_timeout_secs(),
            show_app_updates: default_show_app_updates(),
            log_level: default_log_level(),
            log_to_file: false,
        }
    }
}

impl AppSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    pub fn installation(&self) -> Installation {
        Installation::new(self.app_path.clone(), self.cli_path.clone())
    }

    pub fn preferences(&self) -> SuitePreferences {
        SuitePreferences::new(&self.preferences_dir, &self.suite_name)
    }

    pub fn build_executor(&self) -> Arc<dyn PrivilegedExecutor> {
        match self.executor {
            ExecutorBackend::Dbus => Arc::new(DbusHelperExecutor::new(
                self.helper_service.clone(),
                self.helper_path.clone(),
                self.helper_interface.clone(),
            )),
            ExecutorBackend::Pkexec => Arc::new(PkexecExecutor),
        }
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub fn load_app_settings() -> AppSettings {
    let Some(path) = app_settings_path() else {
        return AppSettings::default();
    };
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> AppSettings {
    let Ok(content) = fs::read_to_string(path) else {
        return AppSettings::default();
    };

    serde_json::from_str(&content).unwrap_or_default()
}

pub fn save_app_settings(settings: &AppSettings) -> Result<(), String> {
    let Some(path) = app_settings_path() else {
        return Err("Unable to determine settings directory".to_string());
    };
    save_settings_to(settings, &path)
}

pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create settings directory: {}", err))?;
    }

    let data = serde_json::to_string_pretty(settings)
        .map_err(|err| format!("Failed to serialize settings: {}", err))?;

    fs::write(path, data).map_err(|err| format!("Failed to write settings: {}", err))
}

fn app_config_dir() -> Option<PathBuf> {
    if let Ok(custom) = env::var("SUPPORT_GTK_CONFIG_DIR") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        let trimmed = config_home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed).join("support-gtk"));
        }
    }

    if let Ok(home) = env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed).join(".config").join("support-gtk"));
        }
    }

    None
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(cache_home) = env::var("XDG_CACHE_HOME") {
        let trimmed = cache_home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed).join("support-gtk"));
        }
    }

    if let Ok(home) = env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed).join(".cache").join("support-gtk"));
        }
    }

    None
}

fn app_settings_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(APP_SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json"));
        assert_eq!(settings.executor, ExecutorBackend::Dbus);
        assert_eq!(settings.suite_name, "nl.root3.catalog");
        assert_eq!(settings.cli_path, PathBuf::from("/usr/local/bin/catalog"));
        assert_eq!(settings.call_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"executor": "pkexec", "call_timeout_secs": 0, "log_level": "debug"}"#,
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.executor, ExecutorBackend::Pkexec);
        assert_eq!(settings.call_timeout(), Duration::from_secs(1));
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Debug);
        assert_eq!(settings.helper_service, "nl.root3.support.helper");
        assert!(settings.show_app_updates);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(load_settings_from(&path).executor, ExecutorBackend::Dbus);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = AppSettings::default();
        settings.window_width = Some(640);
        settings.suite_name = "org.example.catalog".to_string();
        save_settings_to(&settings, &path).unwrap();

        let loaded = load_settings_from(&path);
        assert_eq!(loaded.window_width, Some(640));
        assert_eq!(loaded.preferences().path().file_name().unwrap(), "org.example.catalog.json");
    }
}
