use std::path::Path;

use thiserror::Error;

use super::decode::is_bundle_identifier;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("'{0}' is not a valid application identifier")]
    InvalidIdentifier(String),
    #[error("catalog tool path '{0}' must be absolute and contain no whitespace")]
    InvalidToolPath(String),
}

pub fn check_updates_command(cli_path: &Path) -> Result<String, CommandError> {
    let cli = tool_path(cli_path)?;
    Ok(format!("{} --check-updates", cli))
}

pub fn update_app_command(cli_path: &Path, identifier: &str) -> Result<String, CommandError> {
    if !is_bundle_identifier(identifier) {
        return Err(CommandError::InvalidIdentifier(identifier.to_string()));
    }
    let cli = tool_path(cli_path)?;
    Ok(format!("{} --update {}", cli, identifier))
}

fn tool_path(cli_path: &Path) -> Result<&str, CommandError> {
    let display = cli_path.to_string_lossy();
    match cli_path.to_str() {
        Some(text) if cli_path.is_absolute() && !text.chars().any(char::is_whitespace) => {
            Ok(text)
        }
        _ => Err(CommandError::InvalidToolPath(display.into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn check_command_uses_configured_tool() {
        let cli = PathBuf::from("/usr/local/bin/catalog");
        assert_eq!(
            check_updates_command(&cli).unwrap(),
            "/usr/local/bin/catalog --check-updates"
        );
    }

    #[test]
    fn update_command_validates_identifier() {
        let cli = PathBuf::from("/usr/local/bin/catalog");
        assert_eq!(
            update_app_command(&cli, "com.google.Chrome").unwrap(),
            "/usr/local/bin/catalog --update com.google.Chrome"
        );
        assert_eq!(
            update_app_command(&cli, "x && reboot"),
            Err(CommandError::InvalidIdentifier("x && reboot".to_string()))
        );
    }

    #[test]
    fn relative_or_spaced_tool_paths_are_rejected() {
        assert!(matches!(
            check_updates_command(&PathBuf::from("catalog")),
            Err(CommandError::InvalidToolPath(_))
        ));
        assert!(matches!(
            check_updates_command(&PathBuf::from("/opt/my tools/catalog")),
            Err(CommandError::InvalidToolPath(_))
        ));
    }
}
