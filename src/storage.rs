use crate::canonical::{canonicalize, mark_saved};
use crate::model::{CanonicalState, Scope};
use crate::workbook::WorkbookData;
use chrono::{DateTime, Utc};
use gloo_storage::errors::StorageError as BackendError;
use gloo_storage::{LocalStorage, Storage};
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

const STORAGE_PREFIX: &str = "shorttrack_champions_";
const STORAGE_VERSION: &str = "v1";
pub const WORKBOOK_KEY: &str = "shorttrack_hub_excel_data_v1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not save {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: BackendError,
    },
}

pub fn storage_key(scope: Scope) -> String {
    format!("{}{}_{}", STORAGE_PREFIX, scope.key(), STORAGE_VERSION)
}

/// The scope whose champions blob lives under `key`, if any. Used to decide
/// whether a cross-tab storage event needs a re-render.
pub fn scope_for_key(key: &str) -> Option<Scope> {
    Scope::ALL
        .into_iter()
        .find(|scope| storage_key(*scope) == key)
}

/// Canonical state from stored JSON text. Unparseable text counts as empty.
pub fn decode_state(text: &str) -> CanonicalState {
    match serde_json::from_str::<Value>(text) {
        Ok(raw) => canonicalize(&raw),
        Err(err) => {
            warn!("Ignoring unreadable champions data: {}", err);
            CanonicalState::default()
        }
    }
}

/// Canonical, time-stamped form of whatever the page hands over for saving.
pub fn prepare_for_save(raw: &Value, now: DateTime<Utc>) -> CanonicalState {
    let mut state = canonicalize(raw);
    mark_saved(&mut state, now);
    state
}

fn read_raw(key: &str) -> Option<Value> {
    match LocalStorage::get::<Value>(key) {
        Ok(raw) => Some(raw),
        Err(BackendError::KeyNotFound(_)) => None,
        Err(err) => {
            warn!("Falling back to empty champions for {}: {}", key, err);
            None
        }
    }
}

/// Canonical state of a scope; missing or unreadable data is empty.
pub fn load_state(scope: Scope) -> CanonicalState {
    let key = storage_key(scope);
    let state = read_raw(&key)
        .map(|raw| canonicalize(&raw))
        .unwrap_or_default();
    debug!("loaded {} champions records for {}", state.record_count(), key);
    state
}

/// Like [`load_state`], but also writes the canonical form back so older
/// pages and other tabs read the same shape. A failed rewrite only logs.
pub fn migrate_state(scope: Scope) -> CanonicalState {
    let key = storage_key(scope);
    let Some(raw) = read_raw(&key) else {
        return CanonicalState::default();
    };

    let state = canonicalize(&raw);
    if let Err(err) = LocalStorage::set(&key, &state) {
        warn!("Failed to rewrite canonical champions for {}: {}", key, err);
    }
    debug!("migrated {} champions records for {}", state.record_count(), key);
    state
}

/// Writes an already committed state. The in-memory state stays valid when
/// this fails (quota exceeded), so callers only need to warn.
pub fn save_state(scope: Scope, state: &CanonicalState) -> Result<(), StorageError> {
    let key = storage_key(scope);
    LocalStorage::set(&key, state).map_err(|source| StorageError::Write { key, source })
}

pub fn load_workbook() -> Option<WorkbookData> {
    match LocalStorage::get::<WorkbookData>(WORKBOOK_KEY) {
        Ok(data) => Some(data),
        Err(BackendError::KeyNotFound(_)) => None,
        Err(err) => {
            warn!("Could not read uploaded workbook: {}", err);
            None
        }
    }
}

/// Large workbooks can exceed the storage quota.
pub fn save_workbook(data: &WorkbookData) -> Result<(), StorageError> {
    LocalStorage::set(WORKBOOK_KEY, data).map_err(|source| StorageError::Write {
        key: WORKBOOK_KEY.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_versioned_per_scope() {
        assert_eq!(storage_key(Scope::World), "shorttrack_champions_world_v1");
        assert_eq!(storage_key(Scope::Olympic), "shorttrack_champions_olympic_v1");
    }

    #[test]
    fn storage_keys_map_back_to_scopes() {
        assert_eq!(scope_for_key("shorttrack_champions_olympic_v1"), Some(Scope::Olympic));
        assert_eq!(scope_for_key("shorttrack_champions_world_v1"), Some(Scope::World));
        assert_eq!(scope_for_key("shorttrack_champions_world_v2"), None);
        assert_eq!(scope_for_key(WORKBOOK_KEY), None);
    }

    #[test]
    fn unreadable_text_decodes_to_empty_state() {
        assert_eq!(decode_state("{not json"), CanonicalState::default());
        assert_eq!(decode_state("null"), CanonicalState::default());
    }

    #[test]
    fn decode_canonicalizes_legacy_text() {
        let state = decode_state(r#"{"500": [{"year": "2002", "gold": "Apolo Ohno, USA"}]}"#);
        assert_eq!(state.men.m500.len(), 1);
        assert_eq!(state.men.m500[0].gold.land, "USA");
    }

    #[test]
    fn prepared_state_is_canonical_and_stamped() {
        let now = DateTime::parse_from_rfc3339("2026-01-05T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let raw = json!({
            "women": {"relay": [{"_id": "a", "year": "2022", "gold": ["Netherlands", "ned"]}]},
            "meta": {"updatedAt": "2020-01-01T00:00:00Z"},
        });
        let state = prepare_for_save(&raw, now);
        assert_eq!(state.women.relay[0].gold.land, "NED");
        assert_eq!(state.meta.updated_at.as_deref(), Some("2026-01-05T08:00:00.000Z"));

        let reloaded = decode_state(&serde_json::to_string(&state).unwrap());
        assert_eq!(reloaded, state);
    }
}
