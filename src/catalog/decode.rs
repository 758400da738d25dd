use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::UpdateItem;

use super::preferences::PreferenceStore;

static BUNDLE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*$")
        .expect("bundle identifier pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("key '{0}' does not exist")]
    MissingKey(String),
    #[error("invalid format: {0}")]
    Malformed(String),
}

pub fn is_bundle_identifier(value: &str) -> bool {
    value.len() <= 255 && BUNDLE_IDENTIFIER.is_match(value)
}

/// Looks up `key` and decodes the cached update list.
///
/// The list is all-or-nothing: one bad entry rejects the whole blob.
pub fn read_updates(store: &dyn PreferenceStore, key: &str) -> Result<Vec<UpdateItem>, DecodeError> {
    let blob = store
        .data(key)
        .map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let Some(blob) = blob else {
        return Err(DecodeError::MissingKey(key.to_string()));
    };
    decode_updates(&blob)
}

pub fn decode_updates(blob: &[u8]) -> Result<Vec<UpdateItem>, DecodeError> {
    let items: Vec<UpdateItem> =
        serde_json::from_slice(blob).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    for (index, item) in items.iter().enumerate() {
        validate_item(item).map_err(|reason| {
            DecodeError::Malformed(format!("item {}: {}", index, reason))
        })?;
    }

    Ok(items)
}

fn validate_item(item: &UpdateItem) -> Result<(), String> {
    if !is_bundle_identifier(&item.id) {
        return Err(format!("invalid identifier '{}'", item.id));
    }
    if item.name.trim().is_empty() {
        return Err("empty name".to_string());
    }
    if item.version.trim().is_empty() || item.new_version.trim().is_empty() {
        return Err("empty version".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::preferences::{MemoryPreferences, SuitePreferences};
    use serde_json::json;

    const VALID: &str = r#"[
        {"id": "com.google.Chrome", "name": "Google Chrome", "version": "120.0", "newVersion": "121.0"},
        {"id": "org.mozilla.firefox", "name": "Firefox", "version": "119", "newVersion": "120", "icon": "ignored"}
    ]"#;

    #[test]
    fn decodes_valid_blob_and_ignores_extra_fields() {
        let items = decode_updates(VALID.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "com.google.Chrome");
        assert_eq!(items[1].new_version, "120");
    }

    #[test]
    fn decoding_twice_yields_equal_lists() {
        let first = decode_updates(VALID.as_bytes()).unwrap();
        let second = decode_updates(VALID.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_key_is_distinct_from_malformed() {
        let store = MemoryPreferences::new();
        assert_eq!(
            read_updates(&store, "UpdateDetails"),
            Err(DecodeError::MissingKey("UpdateDetails".to_string()))
        );

        store.set("UpdateDetails", json!("[{\"id\": "));
        assert!(matches!(
            read_updates(&store, "UpdateDetails"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_suite_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SuitePreferences::new(dir.path(), "nl.root3.catalog");
        std::fs::write(store.path(), "{\"UpdateDetails\":\"[{\\\"id\":\n").unwrap();

        assert!(matches!(
            read_updates(&store, "UpdateDetails"),
            Err(DecodeError::Malformed(_))
        ));

        std::fs::remove_file(store.path()).unwrap();
        assert_eq!(
            read_updates(&store, "UpdateDetails"),
            Err(DecodeError::MissingKey("UpdateDetails".to_string()))
        );
    }

    #[test]
    fn one_bad_item_rejects_the_whole_list() {
        let blob = json!([
            {"id": "com.example.good", "name": "Good", "version": "1", "newVersion": "2"},
            {"id": "com.example.bad", "name": "Bad", "version": 1, "newVersion": "2"}
        ]);
        let result = decode_updates(blob.to_string().as_bytes());
        assert!(matches!(result, Err(DecodeError::Malformed(_))));

        let blob = json!([
            {"id": "com.example.good", "name": "Good", "version": "1", "newVersion": "2"},
            {"id": "rm -rf /", "name": "Bad", "version": "1", "newVersion": "2"}
        ]);
        let err = decode_updates(blob.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("item 1"));
    }

    #[test]
    fn type_mismatched_root_is_malformed() {
        assert!(matches!(
            decode_updates(br#"{"id": "com.example.app"}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(decode_updates(b""), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn empty_list_is_valid() {
        assert_eq!(decode_updates(b"[]").unwrap(), Vec::new());
    }

    #[test]
    fn bundle_identifier_pattern() {
        assert!(is_bundle_identifier("com.microsoft.Word"));
        assert!(is_bundle_identifier("zoom_us"));
        assert!(!is_bundle_identifier(""));
        assert!(!is_bundle_identifier("com..double"));
        assert!(!is_bundle_identifier("app; reboot"));
        assert!(!is_bundle_identifier("-flag"));
    }
}
