//! Write-Ahead Log for store durability
//!
//! Every accepted write is appended here before subscribers are notified.
//! On startup the log is replayed in order to rebuild the tree.
//!
//! Format per entry:
//! - length: u32 (4 bytes)
//! - data: [u8; length] (bincode-serialized `WalEntry`)
//! - crc: u32 (4 bytes, CRC32 of length + data)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::error::{StoreError, StoreResult};
use super::path::validate_key;

/// Largest entry that is written or replayed
const MAX_ENTRY_LEN: usize = 4 * 1024 * 1024;

/// Sync strategy for WAL writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalSyncMode {
    /// Fsync after every write (safest, slowest)
    EveryWrite,
    /// Fsync in batches (balanced)
    #[default]
    Batched,
    /// No fsync, rely on OS (fastest, risk of loss)
    None,
}

/// One recorded write
///
/// The value is kept as JSON text because bincode cannot decode
/// self-describing `serde_json::Value`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Store path the value was written to
    pub path: String,
    /// JSON text of the written value (`null` for deletes)
    pub value: String,
}

impl WalEntry {
    pub fn new(path: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            path: path.into(),
            value: value.to_string(),
        }
    }

    pub fn json_value(&self) -> StoreResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.value)?)
    }
}

/// Write-Ahead Log
pub struct WriteAheadLog {
    writer: BufWriter<File>,
    path: PathBuf,
    entry_count: u64,
    bytes_since_sync: usize,
    sync_mode: WalSyncMode,
    sync_threshold: usize,
}

impl WriteAheadLog {
    /// Open or create a WAL file. A torn or corrupt tail is cut off so new
    /// entries land directly behind the last good one.
    pub fn open(path: impl AsRef<Path>, sync_mode: WalSyncMode) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let (entry_count, valid_len) = Self::scan(&path)?;
        let file_len = file.metadata()?.len();
        if file_len > valid_len {
            tracing::warn!(
                wal = %path.display(),
                valid_len,
                dropped_bytes = file_len - valid_len,
                "Truncating corrupt WAL tail"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            entry_count,
            bytes_since_sync: 0,
            sync_mode,
            sync_threshold: 64 * 1024,
        })
    }

    /// Count readable entries and the byte length they cover
    fn scan(path: &Path) -> StoreResult<(u64, u64)> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut count = 0u64;
        let mut valid_len = 0u64;

        loop {
            match Self::read_entry_from(&mut reader) {
                Ok(Some((_, size))) => {
                    count += 1;
                    valid_len += size;
                }
                Ok(None) => break,
                Err(StoreError::Io(e)) if e.kind() != std::io::ErrorKind::UnexpectedEof => {
                    return Err(StoreError::Io(e));
                }
                Err(e) => {
                    tracing::warn!(entry = count, error = %e, "WAL corruption detected");
                    break;
                }
            }
        }

        Ok((count, valid_len))
    }

    /// Append one entry. Entries over the replay limit are rejected so the
    /// log never holds something it cannot read back.
    pub fn append(&mut self, entry: &WalEntry) -> StoreResult<()> {
        let frame = encode(entry)?;
        self.writer.write_all(&frame)?;

        self.entry_count += 1;
        self.bytes_since_sync += frame.len();

        self.maybe_sync()
    }

    fn maybe_sync(&mut self) -> StoreResult<()> {
        match self.sync_mode {
            WalSyncMode::EveryWrite => self.sync()?,
            WalSyncMode::Batched => {
                if self.bytes_since_sync >= self.sync_threshold {
                    self.sync()?;
                } else {
                    self.writer.flush()?;
                }
            }
            WalSyncMode::None => self.writer.flush()?,
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> StoreResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.bytes_since_sync = 0;
        Ok(())
    }

    /// Read all valid entries. Reading stops at the first corrupt entry;
    /// everything before it is returned.
    pub fn recover(&self) -> StoreResult<Vec<WalEntry>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        loop {
            match Self::read_entry_from(&mut reader) {
                Ok(Some((entry, _))) => entries.push(entry),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        recovered = entries.len(),
                        error = %e,
                        "WAL recovery stopped early"
                    );
                    break;
                }
            }
        }

        Ok(entries)
    }

    /// Next entry and its size on disk; `None` at a clean end of file
    fn read_entry_from<R: Read>(reader: &mut R) -> StoreResult<Option<(WalEntry, u64)>> {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;

        if len > MAX_ENTRY_LEN {
            return Err(StoreError::Corruption(format!("Entry length too large: {}", len)));
        }

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;

        let mut crc_buf = [0u8; 4];
        reader.read_exact(&mut crc_buf)?;
        let stored_crc = u32::from_le_bytes(crc_buf);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len_buf);
        hasher.update(&data);
        let computed_crc = hasher.finalize();

        if stored_crc != computed_crc {
            return Err(StoreError::Corruption(format!(
                "CRC mismatch: stored={}, computed={}",
                stored_crc, computed_crc
            )));
        }

        Ok(Some((bincode::deserialize(&data)?, (len + 8) as u64)))
    }

    /// Replace the log with a snapshot of `root`. Subtrees too big for one
    /// entry are written one child per entry. The snapshot is built in a
    /// side file and renamed over the log, so a failure leaves the old log
    /// in place.
    pub fn compact(&mut self, root: &Value) -> StoreResult<()> {
        let mut frames = Vec::new();
        if !root.is_null() {
            snapshot_frames("", root, &mut frames)?;
        }

        self.sync()?;

        let tmp_path = self.path.with_extension("wal.compact");
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for frame in &frames {
                tmp.write_all(frame)?;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        self.writer = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        );
        self.entry_count = frames.len() as u64;
        self.bytes_since_sync = 0;
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `len | data | crc` for one entry
fn encode(entry: &WalEntry) -> StoreResult<Vec<u8>> {
    let data = bincode::serialize(entry)?;
    if data.len() > MAX_ENTRY_LEN {
        return Err(StoreError::EntryTooLarge {
            size: data.len(),
            max: MAX_ENTRY_LEN,
        });
    }

    let len = (data.len() as u32).to_le_bytes();
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&len);
    hasher.update(&data);
    let crc = hasher.finalize();

    let mut frame = Vec::with_capacity(data.len() + 8);
    frame.extend_from_slice(&len);
    frame.extend_from_slice(&data);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Frames that rebuild `value` at `path` when replayed in order
fn snapshot_frames(path: &str, value: &Value, frames: &mut Vec<Vec<u8>>) -> StoreResult<()> {
    let err = match encode(&WalEntry::new(path, value)) {
        Ok(frame) => {
            frames.push(frame);
            return Ok(());
        }
        Err(err) => err,
    };

    match (err, value) {
        (StoreError::EntryTooLarge { .. }, Value::Object(map))
            if map.keys().all(|key| validate_key(key).is_ok()) =>
        {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}/{}", path, key)
                };
                snapshot_frames(&child_path, child, frames)?;
            }
            Ok(())
        }
        (err, _) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{tree, StorePath};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_recover() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
            wal.append(&WalEntry::new("relays/relay1", &json!(true))).unwrap();
            wal.append(&WalEntry::new("settings/unitPrice", &json!(8.5))).unwrap();
            assert_eq!(wal.entry_count(), 2);
        }

        let wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        assert_eq!(wal.entry_count(), 2);

        let entries = wal.recover().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "relays/relay1");
        assert_eq!(entries[0].json_value().unwrap(), json!(true));
        assert_eq!(entries[1].json_value().unwrap(), json!(8.5));
    }

    #[test]
    fn test_corrupt_tail_is_ignored() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
            wal.append(&WalEntry::new("relays/relay1", &json!(true))).unwrap();
        }

        // Garbage after the last good entry
        {
            let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
            file.write_all(&[8, 0, 0, 0, 1, 2, 3]).unwrap();
        }

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
            assert_eq!(wal.entry_count(), 1);
            assert_eq!(wal.recover().unwrap().len(), 1);
            wal.append(&WalEntry::new("relays/relay2", &json!(true))).unwrap();
        }

        // Writes made after the garbage was seen must survive the next restart
        let wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        let entries = wal.recover().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].path, "relays/relay2");
    }

    #[test]
    fn test_torn_length_prefix_then_append() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
            wal.append(&WalEntry::new("relays/relay1", &json!(true))).unwrap();
        }
        let good_len = std::fs::metadata(&wal_path).unwrap().len();

        // Half-written length prefix
        {
            let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
            file.write_all(&[1, 2, 3]).unwrap();
        }

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
            assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), good_len);
            wal.append(&WalEntry::new("relays/relay2", &json!(false))).unwrap();
        }

        let wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        let entries = wal.recover().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].json_value().unwrap(), json!(false));
    }

    #[test]
    fn test_oversized_entry_is_rejected() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        wal.append(&WalEntry::new("relays/relay1", &json!(true))).unwrap();

        let huge = json!("x".repeat(MAX_ENTRY_LEN + 1));
        let result = wal.append(&WalEntry::new("notifications/big", &huge));
        assert!(matches!(result, Err(StoreError::EntryTooLarge { .. })));
        assert_eq!(wal.entry_count(), 1);

        // The log is still usable and replayable
        wal.append(&WalEntry::new("relays/relay2", &json!(true))).unwrap();
        drop(wal);

        let wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        let paths: Vec<String> = wal.recover().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["relays/relay1", "relays/relay2"]);
    }

    #[test]
    fn test_compact_splits_tree_over_entry_limit() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        let note = "x".repeat(900 * 1024);
        let mut daily = serde_json::Map::new();
        for i in 0..6 {
            daily.insert(format!("d{}", i), json!({ "note": note }));
        }
        let root = json!({
            "logs": { "daily": daily },
            "relays": { "relay1": true }
        });
        assert!(root.to_string().len() > MAX_ENTRY_LEN);

        {
            let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::Batched).unwrap();
            wal.compact(&root).unwrap();
            assert!(wal.entry_count() > 1);
        }

        let wal = WriteAheadLog::open(&wal_path, WalSyncMode::Batched).unwrap();
        let mut rebuilt = Value::Null;
        for entry in wal.recover().unwrap() {
            let path = StorePath::parse(&entry.path).unwrap();
            tree::set_at(&mut rebuilt, &path, entry.json_value().unwrap());
        }
        assert_eq!(rebuilt, root);
    }

    #[test]
    fn test_failed_compaction_keeps_log() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::EveryWrite).unwrap();
        wal.append(&WalEntry::new("relays/relay1", &json!(true))).unwrap();

        // A key that cannot become a path, on a subtree too big for one entry
        let root = json!({ "bad.key": "x".repeat(MAX_ENTRY_LEN + 1) });
        assert!(wal.compact(&root).is_err());

        assert_eq!(wal.entry_count(), 1);
        assert_eq!(wal.recover().unwrap()[0].path, "relays/relay1");
    }

    #[test]
    fn test_compact() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("store.wal");

        let mut wal = WriteAheadLog::open(&wal_path, WalSyncMode::Batched).unwrap();
        for i in 0..10 {
            wal.append(&WalEntry::new("loads/load1/power", &json!(i))).unwrap();
        }

        let root = json!({"loads": {"load1": {"power": 9}}});
        wal.compact(&root).unwrap();
        assert_eq!(wal.entry_count(), 1);

        let entries = wal.recover().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "");
        assert_eq!(entries[0].json_value().unwrap(), root);
    }
}
