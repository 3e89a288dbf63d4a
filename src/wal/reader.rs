use std::fs;
use std::path::Path;

use crate::batch::WriteBatch;
use crate::error::{Error, Result};
use crate::wal::record::WalRecord;

/// Reads batches back from a WAL file for replay.
///
/// Loads the entire file into memory, then iterates frame by frame.
/// If a frame fails its CRC or is cut short, replay stops there: it was a
/// partial write from a crash, and every preceding batch is valid.
pub struct WalReader {
    data: Vec<u8>,
}

impl WalReader {
    /// Open a WAL file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(WalReader { data })
    }

    /// Iterate over every valid batch, yielding `(batch, sequence)`.
    pub fn iter(&self) -> WalIterator<'_> {
        WalIterator {
            data: &self.data,
            offset: 0,
            since: None,
            status: None,
        }
    }

    /// Iterate starting at the batch that contains `sequence`. Batches whose
    /// whole sequence range lies before it are skipped.
    pub fn iter_from(&self, sequence: u64) -> WalIterator<'_> {
        WalIterator {
            since: Some(sequence),
            ..self.iter()
        }
    }
}

/// Iterator over WAL batches. Yields batches until EOF or corruption.
///
/// WAL writes are sequential and append-only, so a bad frame marks where
/// the crash happened and nothing valid can follow. The cause is kept in
/// [`status`](WalIterator::status) rather than yielded.
pub struct WalIterator<'a> {
    data: &'a [u8],
    offset: usize,
    since: Option<u64>,
    status: Option<Error>,
}

impl WalIterator<'_> {
    /// Why iteration stopped early, if it did.
    pub fn status(&self) -> Option<&Error> {
        self.status.as_ref()
    }

    /// Byte offset of the next frame.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for WalIterator<'_> {
    type Item = (WriteBatch, u64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.status.is_none() && self.offset < self.data.len() {
            let remaining = &self.data[self.offset..];

            match WalRecord::decode(remaining) {
                Ok(record) => {
                    self.offset += record.encoded_size();
                    let batch = record.batch;
                    let sequence = batch.sequence();
                    if let Some(since) = self.since {
                        let end = sequence.saturating_add(u64::from(batch.count()));
                        if end <= since {
                            continue;
                        }
                    }
                    return Some((batch, sequence));
                }
                Err(e) => {
                    tracing::warn!("WAL replay stopped at offset {}: {}", self.offset, e);
                    self.status = Some(e);
                }
            }
        }
        None
    }
}
