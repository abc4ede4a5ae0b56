//! File-backed decision log: append-only, crc-framed, replayable.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use kestrel_common::error::JournalError;

use crate::record::DecisionRecord;
use crate::{Completion, Journal};

/// Decision log format version for compatibility checks.
pub const JOURNAL_FORMAT_VERSION: u32 = 1;

/// Magic bytes written at the start of the log for validation.
pub const JOURNAL_MAGIC: &[u8; 4] = b"KSTL";

/// Size of the log header: magic (4) + format version (4) = 8 bytes.
pub const JOURNAL_HEADER_SIZE: usize = 8;

const JOURNAL_FILENAME: &str = "kestrel.journal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    None,
    FDataSync,
}

/// Append-only log of decision records.
///
/// One record per submission; the completion callback runs inline once the
/// record is flushed (and synced, per [`SyncMode`]).
pub struct DecisionLog {
    inner: Mutex<DecisionLogInner>,
    sync_mode: SyncMode,
}

struct DecisionLogInner {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl DecisionLog {
    /// Open (or create) the decision log in `dir`.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> Result<Self, JournalError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILENAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new_file = file.metadata().map(|m| m.len()).unwrap_or(0) == 0;

        let mut writer = BufWriter::new(file);
        if is_new_file {
            writer.write_all(JOURNAL_MAGIC)?;
            writer.write_all(&JOURNAL_FORMAT_VERSION.to_le_bytes())?;
            writer.flush()?;
        }

        Ok(Self {
            inner: Mutex::new(DecisionLogInner { writer, path }),
            sync_mode,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }

    fn append(&self, record: &DecisionRecord) -> Result<(), JournalError> {
        let data = bincode::serialize(record)
            .map_err(|e| JournalError::Rejected(e.to_string()))?;
        let checksum = crc32fast::hash(&data);
        let len = data.len() as u32;

        // Record format: [len:4][checksum:4][data:len]
        let mut inner = self.inner.lock();
        inner.writer.write_all(&len.to_le_bytes())?;
        inner.writer.write_all(&checksum.to_le_bytes())?;
        inner.writer.write_all(&data)?;
        inner.writer.flush()?;
        if self.sync_mode == SyncMode::FDataSync {
            inner.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

impl Journal for DecisionLog {
    fn submit(&self, record: DecisionRecord, completion: Completion) -> Result<(), JournalError> {
        self.append(&record)?;
        tracing::debug!(record = %record, "decision record written");
        completion(Ok(()));
        Ok(())
    }
}

/// Reader for crash recovery: replays every decision record in write order.
pub struct DecisionLogReader {
    dir: PathBuf,
}

impl DecisionLogReader {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Read all records. Stops at the first truncated or corrupt frame and
    /// returns the valid prefix.
    pub fn read_all(&self) -> Result<Vec<DecisionRecord>, JournalError> {
        let path = self.dir.join(JOURNAL_FILENAME);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read(&path)?;
        let mut records = Vec::new();
        Self::parse_records(&data, &mut records);
        Ok(records)
    }

    fn parse_records(data: &[u8], records: &mut Vec<DecisionRecord>) {
        let mut pos = 0;

        if data.len() >= JOURNAL_HEADER_SIZE && &data[0..4] == JOURNAL_MAGIC.as_slice() {
            pos = JOURNAL_HEADER_SIZE;
        }
        while pos + 8 <= data.len() {
            let len =
                u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
                    as usize;
            let checksum =
                u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]);
            pos += 8;

            if pos + len > data.len() {
                tracing::warn!(pos, "decision log truncated, stopping replay");
                break;
            }

            let payload = &data[pos..pos + len];
            if crc32fast::hash(payload) != checksum {
                tracing::warn!(pos, "decision log checksum mismatch, stopping replay");
                break;
            }

            match bincode::deserialize::<DecisionRecord>(payload) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(pos, error = %e, "decision log deserialization error, stopping replay");
                    break;
                }
            }
            pos += len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DecisionKind;
    use kestrel_common::types::ReplicaId;

    fn submit(log: &DecisionLog, record: DecisionRecord) {
        log.submit(record, Box::new(|res| res.unwrap())).unwrap();
    }

    #[test]
    fn test_write_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::open(dir.path(), SyncMode::None).unwrap();

        submit(&log, DecisionRecord::confirm(ReplicaId(1), 10));
        submit(&log, DecisionRecord::rollback(ReplicaId(1), 11));

        let records = DecisionLogReader::new(dir.path()).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], DecisionRecord::confirm(ReplicaId(1), 10));
        assert_eq!(records[1].kind, DecisionKind::Rollback);
        assert_eq!(records[1].lsn, 11);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = DecisionLog::open(dir.path(), SyncMode::None).unwrap();
            submit(&log, DecisionRecord::confirm(ReplicaId(1), 5));
        }
        {
            let log = DecisionLog::open(dir.path(), SyncMode::None).unwrap();
            submit(&log, DecisionRecord::confirm(ReplicaId(1), 8));
        }
        let records = DecisionLogReader::new(dir.path()).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].lsn, 8);
    }

    #[test]
    fn test_corrupt_tail_stops_replay() {
        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::open(dir.path(), SyncMode::None).unwrap();
        submit(&log, DecisionRecord::confirm(ReplicaId(1), 5));
        submit(&log, DecisionRecord::confirm(ReplicaId(1), 8));
        let path = log.path();
        drop(log);

        // Flip the last payload byte: the second record's checksum no
        // longer matches and replay must stop after the first record.
        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, &data).unwrap();

        let records = DecisionLogReader::new(dir.path()).read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lsn, 5);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = DecisionLogReader::new(dir.path()).read_all().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_completion_runs_inline() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let log = DecisionLog::open(dir.path(), SyncMode::FDataSync).unwrap();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        log.submit(
            DecisionRecord::confirm(ReplicaId(1), 3),
            Box::new(move |res| {
                res.unwrap();
                flag.store(true, Ordering::SeqCst);
            }),
        )
        .unwrap();
        assert!(called.load(Ordering::SeqCst));
    }
}
