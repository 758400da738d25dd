use serde::{Deserialize, Serialize};

/// One installed application with an update pending in the App Catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    pub id: String,
    pub name: String,
    pub version: String,
    pub new_version: String,
}

impl UpdateItem {
    pub fn version_label(&self) -> String {
        format!("{} → {}", self.version, self.new_version)
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.code.unwrap_or(-1) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_exit_code_is_not_success() {
        let result = CommandResult {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!result.success());
        assert!(CommandResult::from_code(0).success());
        assert!(!CommandResult::from_code(1).success());
    }

    #[test]
    fn update_item_uses_camel_case_fields() {
        let item = UpdateItem {
            id: "com.example.app".to_string(),
            name: "Example".to_string(),
            version: "1.0".to_string(),
            new_version: "1.1".to_string(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["newVersion"], "1.1");
        assert_eq!(item.version_label(), "1.0 → 1.1");
    }
}
