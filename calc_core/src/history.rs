//! # Calculation History
//!
//! A newest-first log of past calculations, capped at [`HISTORY_CAPACITY`]
//! entries and mirrored to a [`KeyValueStore`] under [`HISTORY_KEY`].
//!
//! ## Lifecycle
//!
//! ```text
//! startup ── HistoryStore::load ──► in-memory log
//!                                     │
//!            record / clear ──────────┤── save (whole log) / remove key
//!                                     │
//!            render ◄─────────────────┘   (lazy, restartable)
//! ```
//!
//! ## Persisted format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "entries": [
//!     { "expression": "5 + 3", "result": 8.0, "timestamp": "3:04:05 PM" }
//!   ]
//! }
//! ```
//!
//! A bare array of entries (the browser calculator's format) is read too.
//! Non-finite results are stored as text (`"Infinity"`).
//!
//! A document written by a newer schema is never overwritten implicitly: the
//! store starts empty and keeps new entries in memory only until the user
//! clears the history.

use std::collections::vec_deque;
use std::collections::VecDeque;

use chrono::Local;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::format::DisplayValue;
use crate::replay::{parse_expression, Replay};
use crate::storage::KeyValueStore;

/// Maximum number of entries kept
pub const HISTORY_CAPACITY: usize = 20;

/// Storage key of the serialized log
pub const HISTORY_KEY: &str = "calcHistory";

/// Schema version written to storage
pub const HISTORY_SCHEMA_VERSION: &str = "0.1.0";

/// Shown in place of the list when the log is empty
pub const EMPTY_PLACEHOLDER: &str = "No calculations yet";

/// Question asked before the log is cleared
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear the calculation history?";

// ============================================================================
// Entries
// ============================================================================

/// One past calculation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    expression: String,
    result: DisplayValue,
    timestamp: String,
}

impl HistoryEntry {
    /// Create an entry stamped with the current local time
    pub fn new(expression: impl Into<String>, result: impl Into<DisplayValue>) -> Self {
        HistoryEntry {
            expression: expression.into(),
            result: result.into().storable(),
            timestamp: Local::now().format("%-I:%M:%S %p").to_string(),
        }
    }

    /// Create an entry with an explicit timestamp
    pub fn with_timestamp(
        expression: impl Into<String>,
        result: impl Into<DisplayValue>,
        timestamp: impl Into<String>,
    ) -> Self {
        HistoryEntry {
            expression: expression.into(),
            result: result.into().storable(),
            timestamp: timestamp.into(),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn result(&self) -> &DisplayValue {
        &self.result
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

// ============================================================================
// Log
// ============================================================================

/// Bounded, newest-first sequence of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from entries ordered newest first, dropping any beyond capacity
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        HistoryLog {
            entries: entries.into_iter().take(HISTORY_CAPACITY).collect(),
        }
    }

    /// Put `entry` at the front, evicting the oldest entry when full
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, 0 being the newest
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Entries, newest first
    pub fn iter(&self) -> vec_deque::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    /// Lazy list items over the current log
    pub fn render(&self) -> HistoryItems<'_> {
        HistoryItems {
            inner: self.entries.iter().enumerate(),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// One row of the rendered history list.
#[derive(Debug, Clone, Copy)]
pub struct HistoryItem<'a> {
    pub index: usize,
    pub entry: &'a HistoryEntry,
}

impl<'a> HistoryItem<'a> {
    /// Row text, e.g. `5 + 3 = 8`
    pub fn label(&self) -> String {
        format!("{} = {}", self.entry.expression, self.entry.result)
    }

    /// Panel changes triggered by clicking the row
    pub fn replay(&self) -> Replay {
        parse_expression(&self.entry.expression)
    }
}

/// Iterator over the rendered list. Cloning restarts from the same position.
#[derive(Debug, Clone)]
pub struct HistoryItems<'a> {
    inner: std::iter::Enumerate<vec_deque::Iter<'a, HistoryEntry>>,
}

impl<'a> Iterator for HistoryItems<'a> {
    type Item = HistoryItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(index, entry)| HistoryItem { index, entry })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for HistoryItems<'_> {}

// ============================================================================
// Persistence
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: String,
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned(HistoryDocument),
    Bare(Vec<HistoryEntry>),
}

/// Parse the stored form of the log
fn decode_log(contents: &str) -> CalcResult<HistoryLog> {
    let invalid = |e: serde_json::Error| CalcError::serialization(format!("Invalid history JSON: {}", e));
    let value: serde_json::Value = serde_json::from_str(contents).map_err(invalid)?;

    // Checked before the entries so a newer layout reports a version mismatch
    if let Some(version) = value.get("version").and_then(serde_json::Value::as_str) {
        validate_version(version)?;
    }

    let entries = match serde_json::from_value(value).map_err(invalid)? {
        StoredHistory::Versioned(document) => document.entries,
        StoredHistory::Bare(entries) => entries,
    };

    Ok(HistoryLog::from_entries(entries))
}

fn encode_log(log: &HistoryLog) -> CalcResult<String> {
    let document = HistoryDocument {
        version: HISTORY_SCHEMA_VERSION.to_string(),
        entries: log.iter().cloned().collect(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Same major version required; in 0.x a newer minor is rejected too.
fn validate_version(stored: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        stored_version: stored.to_string(),
        expected_version: HISTORY_SCHEMA_VERSION.to_string(),
    };

    let stored_version = Version::parse(stored).map_err(|_| mismatch())?;
    let current = Version::parse(HISTORY_SCHEMA_VERSION).map_err(|_| mismatch())?;

    if stored_version.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && stored_version.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

/// The history log together with its durable copy.
///
/// Loaded once at startup; every mutation writes the whole log back.
pub struct HistoryStore {
    log: HistoryLog,
    storage: Box<dyn KeyValueStore>,
    writable: bool,
}

impl HistoryStore {
    /// Load the log from `storage`.
    ///
    /// Missing data gives an empty log. Unreadable data is logged and also
    /// gives an empty log; it is overwritten by the next mutation. Data from a
    /// newer schema gives an empty log that is not saved until [`clear`].
    ///
    /// [`clear`]: HistoryStore::clear
    pub fn load(storage: impl KeyValueStore + 'static) -> Self {
        let storage: Box<dyn KeyValueStore> = Box::new(storage);
        let (log, writable) = match Self::read(storage.as_ref()) {
            Ok(log) => (log, true),
            Err(e @ CalcError::VersionMismatch { .. }) => {
                warn!(error = %e, "calculation history is from a newer version, leaving it untouched");
                (HistoryLog::new(), false)
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable calculation history");
                (HistoryLog::new(), true)
            }
        };
        debug!(entries = log.len(), writable, "loaded calculation history");
        HistoryStore { log, storage, writable }
    }

    fn read(storage: &dyn KeyValueStore) -> CalcResult<HistoryLog> {
        match storage.get(HISTORY_KEY)? {
            Some(contents) => decode_log(&contents),
            None => Ok(HistoryLog::new()),
        }
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.log.get(index)
    }

    /// Prepend a new entry and persist the log.
    ///
    /// The in-memory log is updated even if saving fails.
    pub fn record(&mut self, expression: impl Into<String>, result: impl Into<DisplayValue>) -> CalcResult<()> {
        let entry = HistoryEntry::new(expression, result);
        debug!(expression = %entry.expression, result = %entry.result, "recording calculation");
        self.log.push(entry);
        self.save()
    }

    /// Write the whole log to storage. Skipped while a newer-schema document
    /// is being preserved.
    pub fn save(&self) -> CalcResult<()> {
        if !self.writable {
            debug!("history storage holds a newer schema, not saving");
            return Ok(());
        }
        let contents = encode_log(&self.log)?;
        self.storage.set(HISTORY_KEY, &contents)
    }

    /// Clear the log after asking `confirm`.
    ///
    /// Returns `Ok(false)` and leaves everything untouched when the user
    /// declines. On confirmation the log is emptied and the stored key removed.
    pub fn clear(&mut self, confirm: impl FnOnce(&str) -> bool) -> CalcResult<bool> {
        if !confirm(CLEAR_PROMPT) {
            debug!("history clear declined");
            return Ok(false);
        }

        let count = self.log.len();
        self.log.clear();
        self.storage.remove(HISTORY_KEY)?;
        self.writable = true;
        info!("Cleared {} calculations from history", count);
        Ok(true)
    }

    /// Lazy list items over the current log
    pub fn render(&self) -> HistoryItems<'_> {
        self.log.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Operator;
    use crate::replay::BasicOperands;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry::with_timestamp(format!("{} + 0", n), n as f64, "12:00:00 PM")
    }

    #[test]
    fn test_push_prepends() {
        let mut log = HistoryLog::new();
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.get(0), Some(&entry(2)));
        assert_eq!(log.get(1), Some(&entry(1)));
    }

    #[test]
    fn test_push_evicts_oldest_at_capacity() {
        let mut log = HistoryLog::new();
        for n in 0..HISTORY_CAPACITY {
            log.push(entry(n));
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);

        log.push(entry(100));
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.get(0), Some(&entry(100)));
        assert_eq!(log.get(HISTORY_CAPACITY - 1), Some(&entry(1)));
        assert!(log.iter().all(|e| e != &entry(0)));
    }

    #[test]
    fn test_from_entries_truncates() {
        let log = HistoryLog::from_entries((0..30).map(entry));
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.get(0), Some(&entry(0)));
    }

    #[test]
    fn test_timestamp_is_human_readable() {
        let entry = HistoryEntry::new("5 + 3", 8.0);
        assert!(entry.timestamp().ends_with("AM") || entry.timestamp().ends_with("PM"));
        assert_eq!(entry.timestamp().matches(':').count(), 2);
    }

    #[test]
    fn test_render_is_restartable() {
        let log = HistoryLog::from_entries((0..3).map(entry));
        let items = log.render();
        let first: Vec<String> = items.clone().map(|item| item.label()).collect();
        let second: Vec<String> = items.map(|item| item.label()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["0 + 0 = 0", "1 + 0 = 1", "2 + 0 = 2"]);
        assert_eq!(log.render().len(), 3);
    }

    #[test]
    fn test_render_item_replays() {
        let log = HistoryLog::from_entries([HistoryEntry::with_timestamp("5 + 3", 8.0, "1:00:00 PM")]);
        let item = log.render().next().unwrap();
        assert_eq!(
            item.replay(),
            Replay::Basic(Some(BasicOperands {
                num1: 5.0,
                operator: Operator::Add,
                num2: 3.0
            }))
        );
    }

    #[test]
    fn test_record_persists() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("5 + 3", 8.0).unwrap();

        let reloaded = HistoryStore::load(storage);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(0).unwrap().expression(), "5 + 3");
        assert_eq!(reloaded.get(0).unwrap().result(), &DisplayValue::Number(8.0));
    }

    #[test]
    fn test_persisted_document_shape() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("sin(30)", 0.5).unwrap();

        let raw = storage.get(HISTORY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], HISTORY_SCHEMA_VERSION);
        assert_eq!(value["entries"][0]["expression"], "sin(30)");
        assert_eq!(value["entries"][0]["result"], 0.5);
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let storage = MemoryStore::new();
        storage
            .set(
                HISTORY_KEY,
                r#"[{"expression": "6 × 7", "result": 42, "timestamp": "9:15:02 AM"}]"#,
            )
            .unwrap();
        let store = HistoryStore::load(storage);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().timestamp(), "9:15:02 AM");
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let storage = MemoryStore::new();
        storage.set(HISTORY_KEY, "not json").unwrap();
        let store = HistoryStore::load(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_future_schema_is_rejected() {
        assert!(validate_version(HISTORY_SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_newer_schema_survives_record() {
        let newer = r#"{"version": "9.0.0", "entries": {"rows": []}}"#;
        let storage = MemoryStore::new();
        storage.set(HISTORY_KEY, newer).unwrap();

        let mut store = HistoryStore::load(storage.clone());
        assert!(store.is_empty());
        store.record("5 + 3", 8.0).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(storage.get(HISTORY_KEY).unwrap().as_deref(), Some(newer));
    }

    #[test]
    fn test_clear_releases_newer_schema() {
        let storage = MemoryStore::new();
        storage.set(HISTORY_KEY, r#"{"version": "9.0.0", "entries": []}"#).unwrap();

        let mut store = HistoryStore::load(storage.clone());
        assert!(store.clear(|_| true).unwrap());
        store.record("5 + 3", 8.0).unwrap();

        let reloaded = HistoryStore::load(storage);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_infinite_result_survives_reload() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("5 + 3", 8.0).unwrap();
        store.record("factorial(200)", f64::INFINITY).unwrap();

        let reloaded = HistoryStore::load(storage);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(0).unwrap().result(), &DisplayValue::Text("Infinity".to_string()));
        assert_eq!(reloaded.render().next().unwrap().label(), "factorial(200) = Infinity");
    }

    #[test]
    fn test_clear_without_confirmation_keeps_everything() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("5 + 3", 8.0).unwrap();

        assert!(!store.clear(|_| false).unwrap());
        assert_eq!(store.len(), 1);
        assert!(storage.contains(HISTORY_KEY));
    }

    #[test]
    fn test_clear_with_confirmation_removes_state() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("5 + 3", 8.0).unwrap();

        let mut asked = String::new();
        let cleared = store
            .clear(|prompt| {
                asked = prompt.to_string();
                true
            })
            .unwrap();

        assert!(cleared);
        assert_eq!(asked, CLEAR_PROMPT);
        assert!(store.is_empty());
        assert!(!storage.contains(HISTORY_KEY));
        assert_eq!(store.render().count(), 0);
    }

    proptest! {
        #[test]
        fn test_length_never_exceeds_capacity(count in 0usize..60) {
            let mut store = HistoryStore::load(MemoryStore::new());
            for n in 0..count {
                store.record(format!("{} + 1", n), (n + 1) as f64).unwrap();
                prop_assert!(store.len() <= HISTORY_CAPACITY);
            }
            prop_assert_eq!(store.len(), count.min(HISTORY_CAPACITY));
        }

        #[test]
        fn test_record_shifts_previous_entries(count in 1usize..40) {
            let mut store = HistoryStore::load(MemoryStore::new());
            for n in 0..count {
                store.record(format!("{} + 1", n), (n + 1) as f64).unwrap();
            }
            let before: Vec<HistoryEntry> = store.log().iter().cloned().collect();

            store.record("new", 0.0).unwrap();

            prop_assert_eq!(store.get(0).unwrap().expression(), "new");
            let expected_len = (before.len() + 1).min(HISTORY_CAPACITY);
            prop_assert_eq!(store.len(), expected_len);
            for (i, previous) in before.iter().take(expected_len - 1).enumerate() {
                prop_assert_eq!(store.get(i + 1), Some(previous));
            }
        }
    }
}
