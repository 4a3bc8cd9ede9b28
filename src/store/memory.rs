//! In-process observable store
//!
//! Holds the tree and all subscribers behind one async `RwLock`. A write
//! appends to the WAL, mutates the tree and queues notifications while the
//! lock is held, so every subscriber observes writes in the order they were
//! applied.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::{mpsc, RwLock};

use super::error::{StoreError, StoreResult};
use super::path::StorePath;
use super::tree;
use super::wal::{WalEntry, WalSyncMode, WriteAheadLog};
use super::{EventKind, ObservableStore, Snapshot, Subscription};

/// Configuration for [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// WAL file; `None` keeps everything in memory only
    pub wal_path: Option<PathBuf>,
    /// WAL sync strategy
    pub wal_sync: WalSyncMode,
    /// Compact the WAL on open once it holds more entries than this
    pub compact_threshold: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            wal_path: None,
            wal_sync: WalSyncMode::Batched,
            compact_threshold: 10_000,
        }
    }
}

/// Runtime statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub subscribers: usize,
    pub wal_entries: Option<u64>,
    pub top_level_keys: Vec<String>,
}

struct Watcher {
    path: StorePath,
    kind: EventKind,
    sender: mpsc::UnboundedSender<Snapshot>,
}

struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
    wal: Option<WriteAheadLog>,
    last_push_ms: i64,
    push_seq: u64,
}

/// Observable store kept in memory, optionally backed by a WAL
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Volatile store with no persistence
    pub fn in_memory() -> Self {
        Self::from_parts(Value::Null, None)
    }

    /// Open a store, replaying its WAL if one is configured
    pub fn open(config: MemoryStoreConfig) -> StoreResult<Self> {
        let Some(wal_path) = config.wal_path.as_ref() else {
            return Ok(Self::in_memory());
        };

        let mut wal = WriteAheadLog::open(wal_path, config.wal_sync)?;
        let entries = wal.recover()?;

        let mut root = Value::Null;
        for entry in &entries {
            let path = StorePath::parse(&entry.path)?;
            tree::set_at(&mut root, &path, entry.json_value()?);
        }

        tracing::info!(
            wal = %wal_path.display(),
            entries = entries.len(),
            "Store recovered from WAL"
        );

        if wal.entry_count() > config.compact_threshold {
            match wal.compact(&root) {
                Ok(()) => tracing::info!(
                    wal = %wal_path.display(),
                    entries = wal.entry_count(),
                    "WAL compacted"
                ),
                Err(e) => tracing::warn!(
                    wal = %wal_path.display(),
                    error = %e,
                    "WAL compaction failed, keeping the existing log"
                ),
            }
        }

        Ok(Self::from_parts(root, Some(wal)))
    }

    fn from_parts(root: Value, wal: Option<WriteAheadLog>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                root,
                watchers: Vec::new(),
                wal,
                last_push_ms: 0,
                push_seq: 0,
            }),
        }
    }

    /// Flush and fsync the WAL, if any
    pub async fn sync(&self) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(wal) = inner.wal.as_mut() {
            wal.sync()?;
        }
        Ok(())
    }

    /// Rewrite the WAL as a snapshot of the current tree
    pub async fn compact(&self) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let Inner { root, wal, .. } = &mut *inner;
        if let Some(wal) = wal.as_mut() {
            wal.compact(root)?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        StoreStats {
            subscribers: inner
                .watchers
                .iter()
                .filter(|w| !w.sender.is_closed())
                .count(),
            wal_entries: inner.wal.as_ref().map(WriteAheadLog::entry_count),
            top_level_keys: tree::child_keys(&inner.root),
        }
    }
}

impl Inner {
    /// Apply a write and notify every overlapping watcher
    fn write(&mut self, path: &StorePath, value: Value) -> StoreResult<()> {
        if let Some(wal) = self.wal.as_mut() {
            wal.append(&WalEntry::new(path.to_string(), &value))?;
        }

        self.watchers.retain(|w| !w.sender.is_closed());

        // Capture what each affected watcher saw before the write
        let before: Vec<Option<Value>> = self
            .watchers
            .iter()
            .map(|w| w.path.overlaps(path).then(|| tree::get_at(&self.root, &w.path)))
            .collect();

        tree::set_at(&mut self.root, path, value);

        for (watcher, old) in self.watchers.iter().zip(before) {
            let Some(old) = old else { continue };
            let new = tree::get_at(&self.root, &watcher.path);

            match watcher.kind {
                EventKind::Value => {
                    if old != new {
                        let _ = watcher.sender.send(Snapshot::new(watcher.path.clone(), new));
                    }
                }
                EventKind::ChildAdded => {
                    let existing: HashSet<String> = tree::child_keys(&old).into_iter().collect();
                    for key in tree::child_keys(&new) {
                        if existing.contains(&key) {
                            continue;
                        }
                        let child_path = watcher.path.child(&key)?;
                        let child_value = new.get(&key).cloned().unwrap_or(Value::Null);
                        let _ = watcher.sender.send(Snapshot::new(child_path, child_value));
                    }
                }
            }
        }

        Ok(())
    }

    /// Next time-ordered push key. Keys sort lexicographically in
    /// creation order even if the wall clock steps backwards.
    fn next_push_key(&mut self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(self.last_push_ms);
        if now == self.last_push_ms {
            self.push_seq += 1;
        } else {
            self.push_seq = 0;
        }
        self.last_push_ms = now;
        format!("{:013}-{:06}", now, self.push_seq)
    }
}

#[async_trait]
impl ObservableStore for MemoryStore {
    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.write(path, value)?;
        tracing::trace!(path = %path, "Store write");
        Ok(())
    }

    async fn push(&self, path: &StorePath, value: Value) -> StoreResult<String> {
        let mut inner = self.inner.write().await;

        let parent = tree::get_at(&inner.root, path);
        if !(parent.is_null() || parent.is_object()) {
            return Err(StoreError::NotAnObject(path.to_string()));
        }

        let key = inner.next_push_key();
        let child = path.child(&key)?;
        inner.write(&child, value)?;

        tracing::trace!(path = %child, "Store push");
        Ok(key)
    }

    async fn get(&self, path: &StorePath) -> StoreResult<Value> {
        let inner = self.inner.read().await;
        Ok(tree::get_at(&inner.root, path))
    }

    async fn subscribe(&self, path: &StorePath, kind: EventKind) -> StoreResult<Subscription> {
        let mut inner = self.inner.write().await;
        let (sender, receiver) = mpsc::unbounded_channel();

        // Initial delivery happens under the lock so no write can slip
        // between it and registration
        let current = tree::get_at(&inner.root, path);
        match kind {
            EventKind::Value => {
                let _ = sender.send(Snapshot::new(path.clone(), current));
            }
            EventKind::ChildAdded => {
                for key in tree::child_keys(&current) {
                    let child_value = current.get(&key).cloned().unwrap_or(Value::Null);
                    let _ = sender.send(Snapshot::new(path.child(&key)?, child_value));
                }
            }
        }

        inner.watchers.push(Watcher {
            path: path.clone(),
            kind,
            sender,
        });

        tracing::debug!(path = %path, kind = ?kind, "Store subscription added");
        Ok(Subscription::new(path.clone(), kind, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryStore::in_memory();
        store.set(&path("settings/unitPrice"), json!(8.0)).await.unwrap();

        assert_eq!(store.get(&path("settings/unitPrice")).await.unwrap(), json!(8.0));
        assert_eq!(store.get(&path("settings")).await.unwrap(), json!({"unitPrice": 8.0}));
        assert_eq!(store.get(&path("relays")).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_value_subscription_initial_and_changes() {
        let store = MemoryStore::in_memory();
        let mut sub = store.subscribe(&path("relays"), EventKind::Value).await.unwrap();

        let initial = sub.try_next().unwrap();
        assert_eq!(initial.value, Value::Null);

        store.set(&path("relays/relay1"), json!(true)).await.unwrap();
        let snap = sub.try_next().unwrap();
        assert_eq!(snap.path, path("relays"));
        assert_eq!(snap.value, json!({"relay1": true}));

        // Unrelated writes are not delivered
        store.set(&path("loads/load1/voltage"), json!(230)).await.unwrap();
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_value_subscription_skips_unchanged_writes() {
        let store = MemoryStore::in_memory();
        store.set(&path("relays/relay1"), json!(true)).await.unwrap();

        let mut sub = store.subscribe(&path("relays"), EventKind::Value).await.unwrap();
        sub.try_next().unwrap();

        store.set(&path("relays/relay1"), json!(true)).await.unwrap();
        assert!(sub.try_next().is_none());

        store.set(&path("relays/relay1"), json!(false)).await.unwrap();
        assert_eq!(sub.try_next().unwrap().value, json!({"relay1": false}));
    }

    #[tokio::test]
    async fn test_ancestor_write_reaches_descendant_watcher() {
        let store = MemoryStore::in_memory();
        let mut sub = store
            .subscribe(&path("loads/load2"), EventKind::Value)
            .await
            .unwrap();
        sub.try_next().unwrap();

        store
            .set(&path("loads"), json!({"load2": {"power": 12.5}}))
            .await
            .unwrap();
        assert_eq!(sub.try_next().unwrap().value, json!({"power": 12.5}));
    }

    #[tokio::test]
    async fn test_child_added_existing_then_new() {
        let store = MemoryStore::in_memory();
        let notifications = path("notifications");

        store.push(&notifications, json!("first")).await.unwrap();

        let mut sub = store
            .subscribe(&notifications, EventKind::ChildAdded)
            .await
            .unwrap();
        assert_eq!(sub.try_next().unwrap().value, json!("first"));
        assert!(sub.try_next().is_none());

        store.push(&notifications, json!("second")).await.unwrap();
        store.push(&notifications, json!("third")).await.unwrap();

        assert_eq!(sub.try_next().unwrap().value, json!("second"));
        assert_eq!(sub.try_next().unwrap().value, json!("third"));
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_push_keys_are_ordered() {
        let store = MemoryStore::in_memory();
        let notifications = path("notifications");

        let mut keys = Vec::new();
        for i in 0..50 {
            keys.push(store.push(&notifications, json!(i)).await.unwrap());
        }

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let stored = store.get(&notifications).await.unwrap();
        assert_eq!(tree::child_keys(&stored), keys);
    }

    #[tokio::test]
    async fn test_push_under_scalar_fails() {
        let store = MemoryStore::in_memory();
        store.set(&path("settings/unitPrice"), json!(8)).await.unwrap();

        let result = store.push(&path("settings/unitPrice"), json!("x")).await;
        assert!(matches!(result, Err(StoreError::NotAnObject(_))));
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let store = MemoryStore::in_memory();
        let sub = store.subscribe(&path("relays"), EventKind::Value).await.unwrap();
        assert_eq!(store.stats().await.subscribers, 1);

        drop(sub);
        store.set(&path("relays/relay1"), json!(true)).await.unwrap();
        assert_eq!(store.stats().await.subscribers, 0);
    }

    #[tokio::test]
    async fn test_wal_replay() {
        let dir = tempdir().unwrap();
        let config = MemoryStoreConfig {
            wal_path: Some(dir.path().join("store.wal")),
            wal_sync: WalSyncMode::EveryWrite,
            ..Default::default()
        };

        {
            let store = MemoryStore::open(config.clone()).unwrap();
            store.set(&path("relays/relay3"), json!(true)).await.unwrap();
            store.set(&path("timers/minutes/load3"), json!(30)).await.unwrap();
            store.remove(&path("relays/relay3")).await.unwrap();
            store.push(&path("notifications"), json!("hello")).await.unwrap();
        }

        let store = MemoryStore::open(config).unwrap();
        assert_eq!(store.get(&path("relays")).await.unwrap(), Value::Null);
        assert_eq!(store.get(&path("timers/minutes/load3")).await.unwrap(), json!(30));

        let notifications = store.get(&path("notifications")).await.unwrap();
        let keys = tree::child_keys(&notifications);
        assert_eq!(keys.len(), 1);
        assert_eq!(notifications[&keys[0]], json!("hello"));
    }

    #[tokio::test]
    async fn test_compact_on_open() {
        let dir = tempdir().unwrap();
        let config = MemoryStoreConfig {
            wal_path: Some(dir.path().join("store.wal")),
            wal_sync: WalSyncMode::EveryWrite,
            compact_threshold: 5,
        };

        {
            let store = MemoryStore::open(config.clone()).unwrap();
            for i in 0..20 {
                store.set(&path("loads/load1/energy"), json!(i)).await.unwrap();
            }
        }

        let store = MemoryStore::open(config).unwrap();
        assert_eq!(store.stats().await.wal_entries, Some(1));
        assert_eq!(store.get(&path("loads/load1/energy")).await.unwrap(), json!(19));
    }

    #[tokio::test]
    async fn test_large_tree_survives_compaction_and_restart() {
        let dir = tempdir().unwrap();
        let config = MemoryStoreConfig {
            wal_path: Some(dir.path().join("store.wal")),
            wal_sync: WalSyncMode::EveryWrite,
            compact_threshold: 3,
        };
        let note = "x".repeat(900 * 1024);

        {
            let store = MemoryStore::open(config.clone()).unwrap();
            for i in 0..6 {
                store
                    .set(&path(&format!("logs/daily/d{}/note", i)), json!(note))
                    .await
                    .unwrap();
            }
        }

        // First reopen compacts, second replays the compacted log
        {
            let store = MemoryStore::open(config.clone()).unwrap();
            assert!(store.stats().await.wal_entries.unwrap() <= 6);
        }
        let store = MemoryStore::open(config).unwrap();

        let daily = store.get(&path("logs/daily")).await.unwrap();
        assert_eq!(tree::child_keys(&daily).len(), 6);
        assert_eq!(
            store.get(&path("logs/daily/d5/note")).await.unwrap(),
            json!(note)
        );
    }

    #[tokio::test]
    async fn test_oversized_write_leaves_tree_unchanged() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::open(MemoryStoreConfig {
            wal_path: Some(dir.path().join("store.wal")),
            wal_sync: WalSyncMode::EveryWrite,
            ..Default::default()
        })
        .unwrap();
        store.set(&path("logs/daily/d0/note"), json!("short")).await.unwrap();

        let result = store
            .set(&path("logs/daily/d0/note"), json!("x".repeat(5 * 1024 * 1024)))
            .await;
        assert!(matches!(result, Err(StoreError::EntryTooLarge { .. })));
        assert_eq!(store.get(&path("logs/daily/d0/note")).await.unwrap(), json!("short"));
    }

    #[tokio::test]
    async fn test_writes_after_corrupt_tail_survive_restart() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");
        let config = MemoryStoreConfig {
            wal_path: Some(wal_path.clone()),
            wal_sync: WalSyncMode::EveryWrite,
            ..Default::default()
        };

        {
            let store = MemoryStore::open(config.clone()).unwrap();
            store.set(&path("relays/relay1"), json!(true)).await.unwrap();
        }
        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().append(true).open(&wal_path).unwrap();
            file.write_all(&[7, 7, 7]).unwrap();
        }
        {
            let store = MemoryStore::open(config.clone()).unwrap();
            store.set(&path("relays/relay2"), json!(true)).await.unwrap();
        }

        let store = MemoryStore::open(config).unwrap();
        assert_eq!(
            store.get(&path("relays")).await.unwrap(),
            json!({"relay1": true, "relay2": true})
        );
    }
}
