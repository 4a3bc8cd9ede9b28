//! Observable Key-Value Store
//!
//! The dashboard never talks to a concrete database. It depends on the
//! [`ObservableStore`] capability: write a JSON value at a path, read a
//! point-in-time value, and subscribe to changes below a path.
//!
//! - **path**: `StorePath` parsing and validation
//! - **tree**: pure JSON tree operations
//! - **memory**: `MemoryStore`, the in-process implementation
//! - **wal**: write-ahead log used by `MemoryStore` for durability
//! - **error**: error types
//!
//! # Event semantics
//!
//! ```text
//! Value       → current value on subscribe, then the full value at the
//!               path after every write that changes it
//! ChildAdded  → every existing child on subscribe (in key order), then
//!               each child key that appears afterwards, exactly once
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use energy_tracker::store::{EventKind, MemoryStore, ObservableStore, StorePath};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::in_memory();
//!     let relays = StorePath::parse("relays")?;
//!
//!     let mut sub = store.subscribe(&relays, EventKind::Value).await?;
//!     store.set(&relays.child("relay1")?, json!(true)).await?;
//!
//!     while let Some(snapshot) = sub.next().await {
//!         println!("relays = {}", snapshot.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod path;
pub mod tree;
pub mod wal;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, MemoryStoreConfig, StoreStats};
pub use path::StorePath;
pub use wal::{WalEntry, WalSyncMode, WriteAheadLog};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Which events a subscription receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Full value at the path on every change
    Value,
    /// One event per newly appearing child
    ChildAdded,
}

/// The value found at a path at some instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub path: StorePath,
    pub value: Value,
}

impl Snapshot {
    pub fn new(path: StorePath, value: Value) -> Self {
        Self { path, value }
    }

    /// Last key of the snapshot's path
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }
}

/// Stream of snapshots for one subscription
///
/// Dropping the subscription detaches it; the store prunes it on its next
/// write.
pub struct Subscription {
    path: StorePath,
    kind: EventKind,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub fn new(path: StorePath, kind: EventKind, receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { path, kind, receiver }
    }

    /// Wait for the next event; `None` once the store is gone
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// A hierarchical key-value store whose paths can be observed
#[async_trait]
pub trait ObservableStore: Send + Sync {
    /// Replace the value at `path`. Writing `null` deletes.
    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Append `value` under `path` with a fresh time-ordered key.
    /// Returns the generated key.
    async fn push(&self, path: &StorePath, value: Value) -> StoreResult<String>;

    /// Point-in-time read; `Value::Null` if nothing is stored
    async fn get(&self, path: &StorePath) -> StoreResult<Value>;

    /// Start observing `path`
    async fn subscribe(&self, path: &StorePath, kind: EventKind) -> StoreResult<Subscription>;

    /// Delete the value at `path`
    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        self.set(path, Value::Null).await
    }
}
