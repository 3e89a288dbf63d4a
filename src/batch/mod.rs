//! Serialized write batches.
//!
//! A batch is an ordered group of operations applied atomically by the
//! engine. Its wire form:
//!
//! ```text
//! batch  := sequence: fixed64 | count: fixed32 | record*
//! record := kValue                     varstring varstring
//!         | kMerge                     varstring varstring
//!         | kDeletion                  varstring
//!         | kSingleDeletion            varstring
//!         | kColumnFamilyValue         varint32 varstring varstring
//!         | kColumnFamilyMerge         varint32 varstring varstring
//!         | kColumnFamilyDeletion      varint32 varstring
//!         | kColumnFamilySingleDeletion varint32 varstring
//!         | kLogData                   varstring
//!         | kBeginPrepareXid | kCommitXid | kRollbackXid   varstring
//!         | kEndPrepareXid | kNoop | kNotUsed
//! varstring := len: varint | data: u8[len]
//! ```
//!
//! `count` covers only data records (puts, merges, deletes).

pub mod handler;
pub mod iterator;
pub mod record;

pub use handler::Handler;
pub use iterator::{BatchIterator, DecodeOptions};
pub use record::{BatchRecord, RecordKind};

use crate::coding::{decode_fixed32, decode_fixed64, put_length_prefixed_slice, put_varint32};

/// 8-byte sequence number followed by a 4-byte record count.
pub const HEADER_SIZE: usize = 12;

/// Builder and owner of a serialized batch buffer.
///
/// Data and log-data records use the same bytes as the engine's native
/// batch, so buffers of those can be handed across in either direction.
/// Transaction markers follow the layout in the module doc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    rep: Vec<u8>,
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBatch {
    /// Empty batch: a zeroed header and no records.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty batch with room for `capacity` bytes (at least the header).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut rep = Vec::with_capacity(capacity.max(HEADER_SIZE));
        rep.resize(HEADER_SIZE, 0);
        WriteBatch { rep }
    }

    /// Wrap an already-serialized buffer, e.g. one produced by the engine.
    /// The contents are not validated until decoded.
    pub fn from_bytes(rep: Vec<u8>) -> Self {
        WriteBatch { rep }
    }

    /// The full serialized form, header included.
    pub fn data(&self) -> &[u8] {
        &self.rep
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.rep
    }

    /// Serialized size in bytes, header included.
    pub fn len(&self) -> usize {
        self.rep.len()
    }

    /// True if no records follow the header.
    pub fn is_empty(&self) -> bool {
        self.rep.len() <= HEADER_SIZE
    }

    /// Drop all records and reset the header.
    pub fn clear(&mut self) {
        self.rep.clear();
        self.rep.resize(HEADER_SIZE, 0);
    }

    /// Number of data records according to the header. 0 for a buffer too
    /// short to hold one.
    pub fn count(&self) -> u32 {
        self.rep
            .get(8..HEADER_SIZE)
            .and_then(decode_fixed32)
            .unwrap_or(0)
    }

    /// Sequence number stamped in the header.
    pub fn sequence(&self) -> u64 {
        self.rep.get(..8).and_then(decode_fixed64).unwrap_or(0)
    }

    pub fn set_sequence(&mut self, sequence: u64) {
        self.ensure_header();
        self.rep[..8].copy_from_slice(&sequence.to_le_bytes());
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.put_cf(0, key, value);
    }

    /// Queue a put into `column_family`. Family 0 is written as a plain put.
    pub fn put_cf(&mut self, column_family: u32, key: &[u8], value: &[u8]) {
        self.push_data(
            column_family,
            RecordKind::Value,
            RecordKind::ColumnFamilyValue,
        );
        put_length_prefixed_slice(&mut self.rep, key);
        put_length_prefixed_slice(&mut self.rep, value);
    }

    pub fn merge(&mut self, key: &[u8], value: &[u8]) {
        self.merge_cf(0, key, value);
    }

    pub fn merge_cf(&mut self, column_family: u32, key: &[u8], value: &[u8]) {
        self.push_data(
            column_family,
            RecordKind::Merge,
            RecordKind::ColumnFamilyMerge,
        );
        put_length_prefixed_slice(&mut self.rep, key);
        put_length_prefixed_slice(&mut self.rep, value);
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.delete_cf(0, key);
    }

    pub fn delete_cf(&mut self, column_family: u32, key: &[u8]) {
        self.push_data(
            column_family,
            RecordKind::Deletion,
            RecordKind::ColumnFamilyDeletion,
        );
        put_length_prefixed_slice(&mut self.rep, key);
    }

    pub fn single_delete(&mut self, key: &[u8]) {
        self.single_delete_cf(0, key);
    }

    pub fn single_delete_cf(&mut self, column_family: u32, key: &[u8]) {
        self.push_data(
            column_family,
            RecordKind::SingleDeletion,
            RecordKind::ColumnFamilySingleDeletion,
        );
        put_length_prefixed_slice(&mut self.rep, key);
    }

    /// Attach an opaque blob. Not counted and never applied by the engine.
    pub fn put_log_data(&mut self, blob: &[u8]) {
        self.push_marker(RecordKind::LogData, Some(blob));
    }

    pub fn mark_begin_prepare(&mut self, xid: &[u8]) {
        self.push_marker(RecordKind::BeginPrepareXid, Some(xid));
    }

    pub fn mark_end_prepare(&mut self) {
        self.push_marker(RecordKind::EndPrepareXid, None);
    }

    pub fn mark_commit(&mut self, xid: &[u8]) {
        self.push_marker(RecordKind::CommitXid, Some(xid));
    }

    pub fn mark_rollback(&mut self, xid: &[u8]) {
        self.push_marker(RecordKind::RollbackXid, Some(xid));
    }

    pub fn mark_noop(&mut self) {
        self.push_marker(RecordKind::Noop, None);
    }

    /// Pull decoder over this batch.
    pub fn iter(&self) -> BatchIterator<'_> {
        BatchIterator::new(&self.rep)
    }

    pub fn iter_with(&self, options: DecodeOptions) -> BatchIterator<'_> {
        BatchIterator::with_options(&self.rep, options)
    }

    fn push_data(&mut self, column_family: u32, plain: RecordKind, qualified: RecordKind) {
        self.ensure_header();
        let count = self.count().wrapping_add(1);
        self.rep[8..HEADER_SIZE].copy_from_slice(&count.to_le_bytes());

        if column_family == 0 {
            self.rep.push(plain.tag());
        } else {
            self.rep.push(qualified.tag());
            put_varint32(&mut self.rep, column_family);
        }
    }

    fn push_marker(&mut self, kind: RecordKind, payload: Option<&[u8]>) {
        self.ensure_header();
        self.rep.push(kind.tag());
        if let Some(payload) = payload {
            put_length_prefixed_slice(&mut self.rep, payload);
        }
    }

    /// A buffer adopted through `from_bytes` may be shorter than a header.
    /// It already reads as an empty batch, so it becomes one.
    fn ensure_header(&mut self) {
        if self.rep.len() < HEADER_SIZE {
            self.clear();
        }
    }
}
