//! Write-ahead log of serialized batches.
//!
//! Each appended batch is stamped with the next sequence number and framed
//! with a CRC. Replaying the log yields `(batch, sequence)` pairs in append
//! order.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{WalIterator, WalReader};
pub use record::WalRecord;
pub use writer::WalWriter;

/// Controls when the WAL is fsync'd to disk.
///
/// Trade-off: durability vs throughput.
///   - EveryWrite: zero data loss, each append waits for the disk
///   - EveryNWrites: lose up to N batches on crash
///   - EveryNMillis: bounded loss window, checked on each append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// fsync after every batch. Safest, slowest.
    #[default]
    EveryWrite,
    /// fsync every N batches.
    EveryNWrites(usize),
    /// fsync on the first append at least N milliseconds after the last sync.
    EveryNMillis(u64),
}

