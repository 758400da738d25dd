use std::path::PathBuf;

pub const CATALOG_APP_PATH: &str = "/Applications/Catalog.app";
pub const CATALOG_CLI_PATH: &str = "/usr/local/bin/catalog";

/// Where the catalog application and its command-line link are expected.
#[derive(Clone, Debug)]
pub struct Installation {
    pub app_path: PathBuf,
    pub cli_path: PathBuf,
}

impl Default for Installation {
    fn default() -> Self {
        Self {
            app_path: PathBuf::from(CATALOG_APP_PATH),
            cli_path: PathBuf::from(CATALOG_CLI_PATH),
        }
    }
}

impl Installation {
    pub fn new(app_path: impl Into<PathBuf>, cli_path: impl Into<PathBuf>) -> Self {
        Self {
            app_path: app_path.into(),
            cli_path: cli_path.into(),
        }
    }

    /// True when both paths exist and the caller holds a non-empty token.
    pub fn is_installed(&self, authorization: &str) -> bool {
        self.app_path.exists() && self.cli_path.exists() && !authorization.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn layout(app: bool, cli: bool) -> (tempfile::TempDir, Installation) {
        let dir = tempfile::tempdir().unwrap();
        let app_path = dir.path().join("Catalog.app");
        let cli_path = dir.path().join("catalog");
        if app {
            fs::create_dir(&app_path).unwrap();
        }
        if cli {
            fs::write(&cli_path, "#!/bin/sh\n").unwrap();
        }
        (dir, Installation::new(app_path, cli_path))
    }

    #[test]
    fn missing_app_bundle_is_not_installed() {
        let (_dir, install) = layout(false, true);
        assert!(!install.is_installed("abc123"));
    }

    #[test]
    fn missing_cli_is_not_installed() {
        let (_dir, install) = layout(true, false);
        assert!(!install.is_installed("abc123"));
    }

    #[test]
    fn empty_token_is_not_installed() {
        let (_dir, install) = layout(true, true);
        assert!(!install.is_installed(""));
    }

    #[test]
    fn all_conjuncts_hold() {
        let (_dir, install) = layout(true, true);
        assert!(install.is_installed("abc123"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_cli_symlink_is_not_present() {
        let (dir, install) = layout(true, false);
        std::os::unix::fs::symlink(dir.path().join("missing-target"), &install.cli_path).unwrap();
        assert!(!install.is_installed("abc123"));
    }
}
