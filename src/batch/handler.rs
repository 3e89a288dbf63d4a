use crate::batch::record::{RecordKind, decode_record};
use crate::batch::{HEADER_SIZE, WriteBatch};
use crate::coding::Reader;
use crate::error::{Error, Result};

/// Visitor for [`WriteBatch::iterate`].
///
/// Unlike [`BatchIterator`](crate::batch::BatchIterator), this walk mirrors
/// how the engine applies a batch: log data is delivered, and the header
/// count is checked at the end.
pub trait Handler {
    fn put(&mut self, column_family: u32, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete(&mut self, column_family: u32, key: &[u8]) -> Result<()>;

    fn merge(&mut self, _column_family: u32, _key: &[u8], _value: &[u8]) -> Result<()> {
        Err(Error::NotSupported("merge"))
    }

    fn single_delete(&mut self, column_family: u32, key: &[u8]) -> Result<()> {
        self.delete(column_family, key)
    }

    fn log_data(&mut self, _blob: &[u8]) -> Result<()> {
        Ok(())
    }

    fn mark_begin_prepare(&mut self, _xid: &[u8]) -> Result<()> {
        Ok(())
    }

    fn mark_end_prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn mark_commit(&mut self, _xid: &[u8]) -> Result<()> {
        Ok(())
    }

    fn mark_rollback(&mut self, _xid: &[u8]) -> Result<()> {
        Ok(())
    }

    fn mark_noop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Checked before each record; returning false ends the walk early.
    fn should_continue(&mut self) -> bool {
        true
    }
}

impl WriteBatch {
    /// Feed every record to `handler`, in order.
    ///
    /// Stops at the first decode or handler error. Otherwise the walk must
    /// have seen exactly `count()` data records, even when the handler ended
    /// it early through [`Handler::should_continue`].
    pub fn iterate<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        let data = self.data();
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("malformed write batch (too small)".into()));
        }

        let mut reader = Reader::new(data, HEADER_SIZE);
        let mut found: u32 = 0;

        while !reader.is_empty() && handler.should_continue() {
            let record = decode_record(&mut reader, true)?;
            let cf = record.column_family;
            match record.kind {
                RecordKind::Value | RecordKind::ColumnFamilyValue => {
                    handler.put(cf, record.key, record.value)?
                }
                RecordKind::Merge | RecordKind::ColumnFamilyMerge => {
                    handler.merge(cf, record.key, record.value)?
                }
                RecordKind::Deletion | RecordKind::ColumnFamilyDeletion => {
                    handler.delete(cf, record.key)?
                }
                RecordKind::SingleDeletion | RecordKind::ColumnFamilySingleDeletion => {
                    handler.single_delete(cf, record.key)?
                }
                RecordKind::LogData => handler.log_data(record.key)?,
                RecordKind::BeginPrepareXid => handler.mark_begin_prepare(record.key)?,
                RecordKind::EndPrepareXid => handler.mark_end_prepare()?,
                RecordKind::CommitXid => handler.mark_commit(record.key)?,
                RecordKind::RollbackXid => handler.mark_rollback(record.key)?,
                RecordKind::Noop | RecordKind::NotUsed => handler.mark_noop()?,
            }
            if record.kind.is_data() {
                found += 1;
            }
        }

        if found != self.count() {
            return Err(Error::Corruption("write batch has wrong count".into()));
        }
        Ok(())
    }
}
