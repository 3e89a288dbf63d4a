//! # Write-Batch Codec
//!
//! Reads and writes the serialized form of an LSM engine's write batch:
//! the ordered group of puts, merges and deletes the engine applies
//! atomically, plus a small write-ahead log for persisting batches.
//!
//! ## Core idea
//! The engine hands batches around as flat byte buffers. Everything needed
//! to inspect one (replication, replay, debugging) is a parser over that
//! buffer; nothing has to call back into the engine.
//!
//! ```
//! use batchlog::{RecordKind, WriteBatch};
//!
//! let mut batch = WriteBatch::new();
//! batch.put(b"key1", b"value1");
//! batch.delete(b"key3");
//!
//! let mut iter = batch.iter();
//! assert!(iter.advance());
//! assert_eq!(iter.record().kind, RecordKind::Value);
//! assert!(iter.advance());
//! assert_eq!(iter.record().key, b"key3");
//! assert!(!iter.advance());
//! assert!(iter.error().is_none());
//! ```

pub mod batch;
pub mod coding;
pub mod error;
pub mod wal;

// Public re-exports for the top-level API
pub use batch::{BatchIterator, BatchRecord, DecodeOptions, Handler, RecordKind, WriteBatch};
pub use error::{DecodeError, Error, Result};
pub use wal::{SyncPolicy, WalReader, WalWriter};
