//! redb-backed ledger of function versions and edge bindings.
//!
//! Supports on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use edgesite_core::EdgeEvent;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(FUNCTION_VERSIONS).map_err(map_err!(Table))?;
        txn.open_table(EDGE_BINDINGS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Function versions ──────────────────────────────────────────

    /// Publish `source` as a new version of `function` under `tag`.
    ///
    /// If `{function}/{tag}` already exists with the same `sha256` the stored
    /// version is returned with `created = false` and nothing is written. A
    /// different `sha256` under an existing tag is a
    /// [`StateError::TagConflict`]. Otherwise the version
    /// gets the next sequential number for `function`. Lookup and insert run
    /// in one write transaction.
    pub fn publish_version(
        &self,
        function: &str,
        tag: &str,
        sha256: &str,
        source: &str,
    ) -> StateResult<(FunctionVersion, bool)> {
        let key = version_key(function, tag);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let (version, created) = {
            let mut table = txn.open_table(FUNCTION_VERSIONS).map_err(map_err!(Table))?;
            let existing = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => Some(
                    serde_json::from_slice::<FunctionVersion>(guard.value())
                        .map_err(map_err!(Deserialize))?,
                ),
                None => None,
            };

            match existing {
                Some(version) if version.sha256 == sha256 => (version, false),
                Some(version) => {
                    return Err(StateError::TagConflict {
                        key,
                        stored: version.sha256,
                        incoming: sha256.to_string(),
                    });
                }
                None => {
                    let prefix = format!("{function}/");
                    let mut last = 0;
                    for entry in table.iter().map_err(map_err!(Read))? {
                        let (k, v) = entry.map_err(map_err!(Read))?;
                        if k.value().starts_with(&prefix) {
                            let stored: FunctionVersion = serde_json::from_slice(v.value())
                                .map_err(map_err!(Deserialize))?;
                            last = last.max(stored.number);
                        }
                    }

                    let version = FunctionVersion {
                        function: function.to_string(),
                        number: last + 1,
                        tag: tag.to_string(),
                        sha256: sha256.to_string(),
                        source: source.to_string(),
                        published_at: epoch_secs(),
                    };
                    let value = serde_json::to_vec(&version).map_err(map_err!(Serialize))?;
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                    (version, true)
                }
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, number = version.number, created, "function version published");
        Ok((version, created))
    }

    pub fn get_version(&self, function: &str, tag: &str) -> StateResult<Option<FunctionVersion>> {
        let key = version_key(function, tag);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FUNCTION_VERSIONS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let version: FunctionVersion =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(version))
            }
            None => Ok(None),
        }
    }

    /// All versions of `function`, oldest first.
    pub fn list_versions(&self, function: &str) -> StateResult<Vec<FunctionVersion>> {
        let prefix = format!("{function}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FUNCTION_VERSIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let version: FunctionVersion =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(version);
            }
        }
        results.sort_by_key(|v| v.number);
        Ok(results)
    }

    // ── Edge bindings ──────────────────────────────────────────────

    /// Insert or replace the binding for `{distribution}/{event}`.
    pub fn put_binding(&self, binding: &EdgeBinding) -> StateResult<()> {
        let key = binding.table_key();
        let value = serde_json::to_vec(binding).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(EDGE_BINDINGS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version = %binding.version, "edge binding stored");
        Ok(())
    }

    pub fn get_binding(
        &self,
        distribution: &str,
        event: EdgeEvent,
    ) -> StateResult<Option<EdgeBinding>> {
        let key = binding_key(distribution, event);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(EDGE_BINDINGS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let binding: EdgeBinding =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(binding))
            }
            None => Ok(None),
        }
    }

    pub fn list_bindings(&self) -> StateResult<Vec<EdgeBinding>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(EDGE_BINDINGS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let binding: EdgeBinding =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(binding);
        }
        Ok(results)
    }
}

/// Seconds since the Unix epoch, zero if the clock is before it.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesite_core::VersionRef;

    fn binding(distribution: &str, version: VersionRef, previous: Option<VersionRef>) -> EdgeBinding {
        EdgeBinding {
            distribution: distribution.to_string(),
            event: EdgeEvent::ViewerResponse,
            version,
            previous,
            updated_at: 1000,
        }
    }

    // ── Versions ───────────────────────────────────────────────────

    #[test]
    fn publish_assigns_sequential_numbers() {
        let store = StateStore::open_in_memory().unwrap();

        let (v1, created1) = store.publish_version("headers", "111", "aa", "src-1").unwrap();
        let (v2, created2) = store.publish_version("headers", "222", "bb", "src-2").unwrap();

        assert!(created1 && created2);
        assert_eq!(v1.number, 1);
        assert_eq!(v2.number, 2);
        assert_eq!(v2.source, "src-2");
    }

    #[test]
    fn publish_same_tag_is_idempotent() {
        let store = StateStore::open_in_memory().unwrap();

        let (first, _) = store.publish_version("headers", "111", "aa", "src").unwrap();
        let (again, created) = store.publish_version("headers", "111", "aa", "src").unwrap();

        assert!(!created);
        assert_eq!(again, first);
        assert_eq!(store.list_versions("headers").unwrap().len(), 1);
    }

    #[test]
    fn publish_same_tag_with_different_source_conflicts() {
        let store = StateStore::open_in_memory().unwrap();
        store.publish_version("headers", "111", "aa", "x: Aa").unwrap();

        let err = store
            .publish_version("headers", "111", "bb", "x: BB")
            .unwrap_err();
        match err {
            StateError::TagConflict { key, stored, incoming } => {
                assert_eq!(key, "headers/111");
                assert_eq!(stored, "aa");
                assert_eq!(incoming, "bb");
            }
            other => panic!("expected tag conflict, got {other:?}"),
        }

        // The first publication is untouched.
        let versions = store.list_versions("headers").unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].source, "x: Aa");
    }

    #[test]
    fn numbering_is_per_function() {
        let store = StateStore::open_in_memory().unwrap();

        store.publish_version("headers", "1", "a", "x").unwrap();
        store.publish_version("headers", "2", "b", "y").unwrap();
        let (other, _) = store.publish_version("headers-staging", "1", "a", "x").unwrap();

        assert_eq!(other.number, 1);
        assert_eq!(store.list_versions("headers").unwrap().len(), 2);
        assert_eq!(store.list_versions("headers-staging").unwrap().len(), 1);
    }

    #[test]
    fn list_versions_ordered_by_number() {
        let store = StateStore::open_in_memory().unwrap();

        // Keys sort lexically; numbers must still come back in publish order.
        for tag in ["900", "-5", "12", "abc"] {
            store.publish_version("headers", tag, "h", tag).unwrap();
        }

        let numbers: Vec<_> = store
            .list_versions("headers")
            .unwrap()
            .iter()
            .map(|v| v.number)
            .collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
        assert_eq!(store.list_versions("headers").unwrap()[3].tag, "abc");
    }

    #[test]
    fn get_version_by_tag() {
        let store = StateStore::open_in_memory().unwrap();
        store.publish_version("headers", "42", "h", "src").unwrap();

        let found = store.get_version("headers", "42").unwrap().unwrap();
        assert_eq!(found.number, 1);
        assert_eq!(found.version_ref().qualified(), "headers:1");
        assert!(store.get_version("headers", "43").unwrap().is_none());
    }

    // ── Bindings ───────────────────────────────────────────────────

    #[test]
    fn binding_put_get_and_replace() {
        let store = StateStore::open_in_memory().unwrap();
        let (v1, _) = store.publish_version("headers", "1", "a", "x").unwrap();
        let (v2, _) = store.publish_version("headers", "2", "b", "y").unwrap();

        store.put_binding(&binding("site", v1.version_ref(), None)).unwrap();
        store
            .put_binding(&binding("site", v2.version_ref(), Some(v1.version_ref())))
            .unwrap();

        let current = store
            .get_binding("site", EdgeEvent::ViewerResponse)
            .unwrap()
            .unwrap();
        assert_eq!(current.version.number, 2);
        assert_eq!(current.previous.unwrap().number, 1);
        assert_eq!(store.list_bindings().unwrap().len(), 1);

        // The replaced version is still retrievable.
        assert!(store.get_version("headers", "1").unwrap().is_some());
    }

    #[test]
    fn bindings_are_keyed_by_event() {
        let store = StateStore::open_in_memory().unwrap();
        let (v1, _) = store.publish_version("headers", "1", "a", "x").unwrap();

        store.put_binding(&binding("site", v1.version_ref(), None)).unwrap();
        assert!(store
            .get_binding("site", EdgeEvent::OriginResponse)
            .unwrap()
            .is_none());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            let (v1, _) = store.publish_version("headers", "1", "a", "x").unwrap();
            store.put_binding(&binding("site", v1.version_ref(), None)).unwrap();
        }

        let store = StateStore::open(&db_path).unwrap();
        assert_eq!(store.list_versions("headers").unwrap().len(), 1);
        let (v2, created) = store.publish_version("headers", "2", "b", "y").unwrap();
        assert!(created);
        assert_eq!(v2.number, 2);
        assert!(store
            .get_binding("site", EdgeEvent::ViewerResponse)
            .unwrap()
            .is_some());
    }

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_versions("headers").unwrap().is_empty());
        assert!(store.get_version("headers", "1").unwrap().is_none());
        assert!(store.list_bindings().unwrap().is_empty());
        assert!(store
            .get_binding("nope", EdgeEvent::ViewerResponse)
            .unwrap()
            .is_none());
    }
}
