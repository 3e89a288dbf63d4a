use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::batch::WriteBatch;
use crate::error::{Error, Result};
use crate::wal::SyncPolicy;
use crate::wal::reader::WalReader;
use crate::wal::record::WalRecord;

/// Appends batches to a WAL file on disk.
///
/// Each batch is stamped with the next sequence number before it is written;
/// a batch of `count` records consumes `count` sequence numbers.
///
/// Two layers of buffering:
///   BufWriter.flush()  → Rust buffer → OS page cache
///   file.sync_all()    → OS page cache → physical disk
pub struct WalWriter {
    writer: BufWriter<File>,
    offset: u64,
    sync_policy: SyncPolicy,
    writes_since_sync: usize,
    last_sync: Instant,
    last_sequence: u64,
}

impl WalWriter {
    /// Open (or create) a WAL file at the given path for appending.
    ///
    /// An existing log is replayed so numbering continues after its last
    /// batch. A torn tail is cut off; frames appended after it would never
    /// be reached on replay.
    pub fn new(path: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut offset = file.metadata()?.len();
        let mut last_sequence = 0;

        if offset > 0 {
            let reader = WalReader::open(path)?;
            let mut iter = reader.iter();
            for (batch, sequence) in iter.by_ref() {
                let end = sequence.saturating_add(u64::from(batch.count()));
                last_sequence = last_sequence.max(end.saturating_sub(1));
            }

            let valid = iter.offset() as u64;
            if valid < offset {
                tracing::warn!(
                    "truncating WAL {} from {} to {} bytes",
                    path.display(),
                    offset,
                    valid
                );
                file.set_len(valid)?;
                offset = valid;
            }
        }

        Ok(WalWriter {
            writer: BufWriter::new(file),
            offset,
            sync_policy,
            writes_since_sync: 0,
            last_sync: Instant::now(),
            last_sequence,
        })
    }

    /// Resume numbering after `sequence`, e.g. the last one seen on replay.
    pub fn set_last_sequence(&mut self, sequence: u64) {
        self.last_sequence = sequence;
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Stamp `batch` with the next sequence number and append it.
    /// Depending on SyncPolicy, may fsync after this write.
    ///
    /// Returns the sequence number the batch was stamped with. Fails without
    /// writing if the batch would run past `u64::MAX`.
    pub fn append(&mut self, batch: &mut WriteBatch) -> Result<u64> {
        let count = u64::from(batch.count());
        let (Some(sequence), Some(last_sequence)) = (
            self.last_sequence.checked_add(1),
            self.last_sequence.checked_add(count),
        ) else {
            return Err(Error::Corruption("WAL sequence number overflow".into()));
        };
        batch.set_sequence(sequence);

        let encoded = WalRecord::encode_batch(batch)?;
        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        self.offset += encoded.len() as u64;
        self.writes_since_sync += 1;
        self.last_sequence = last_sequence;

        tracing::trace!(
            sequence,
            count = batch.count(),
            bytes = encoded.len(),
            "appended batch to WAL"
        );

        let due = match self.sync_policy {
            SyncPolicy::EveryWrite => true,
            SyncPolicy::EveryNWrites(n) => self.writes_since_sync >= n,
            SyncPolicy::EveryNMillis(ms) => self.last_sync.elapsed() >= Duration::from_millis(ms),
        };
        if due {
            self.sync()?;
        }

        Ok(sequence)
    }

    /// Force fsync to disk. Ensures all buffered writes are durable.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.writes_since_sync = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Current file size in bytes, including frames from earlier sessions.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Appends since the last fsync.
    pub fn writes_since_sync(&self) -> usize {
        self.writes_since_sync
    }
}
