use crate::coding::Reader;
use crate::error::DecodeError;

/// Tag byte at the start of every record in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordKind {
    /// Tag 0, so also the kind of the zero-valued record.
    #[default]
    Deletion = 0x00,
    Value = 0x01,
    Merge = 0x02,
    LogData = 0x03,
    ColumnFamilyDeletion = 0x04,
    ColumnFamilyValue = 0x05,
    ColumnFamilyMerge = 0x06,
    SingleDeletion = 0x07,
    ColumnFamilySingleDeletion = 0x08,
    BeginPrepareXid = 0x09,
    EndPrepareXid = 0x0A,
    CommitXid = 0x0B,
    RollbackXid = 0x0C,
    Noop = 0x0D,
    NotUsed = 0x7F,
}

impl RecordKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        let kind = match tag {
            0x00 => RecordKind::Deletion,
            0x01 => RecordKind::Value,
            0x02 => RecordKind::Merge,
            0x03 => RecordKind::LogData,
            0x04 => RecordKind::ColumnFamilyDeletion,
            0x05 => RecordKind::ColumnFamilyValue,
            0x06 => RecordKind::ColumnFamilyMerge,
            0x07 => RecordKind::SingleDeletion,
            0x08 => RecordKind::ColumnFamilySingleDeletion,
            0x09 => RecordKind::BeginPrepareXid,
            0x0A => RecordKind::EndPrepareXid,
            0x0B => RecordKind::CommitXid,
            0x0C => RecordKind::RollbackXid,
            0x0D => RecordKind::Noop,
            0x7F => RecordKind::NotUsed,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether a varint column family index follows the tag.
    pub fn has_column_family(self) -> bool {
        matches!(
            self,
            RecordKind::ColumnFamilyDeletion
                | RecordKind::ColumnFamilyValue
                | RecordKind::ColumnFamilyMerge
                | RecordKind::ColumnFamilySingleDeletion
        )
    }

    /// Whether a length-prefixed key follows. For LogData the "key" is the blob,
    /// and for the XID markers it is the transaction id.
    pub fn has_key(self) -> bool {
        !matches!(
            self,
            RecordKind::EndPrepareXid | RecordKind::Noop | RecordKind::NotUsed
        )
    }

    /// Whether a length-prefixed value follows the key.
    pub fn has_value(self) -> bool {
        matches!(
            self,
            RecordKind::Value
                | RecordKind::Merge
                | RecordKind::ColumnFamilyValue
                | RecordKind::ColumnFamilyMerge
        )
    }

    /// Whether this kind is counted in the batch header.
    ///
    /// Log data and transaction markers ride along in the batch without
    /// bumping the count.
    pub fn is_data(self) -> bool {
        matches!(
            self,
            RecordKind::Deletion
                | RecordKind::Value
                | RecordKind::Merge
                | RecordKind::ColumnFamilyDeletion
                | RecordKind::ColumnFamilyValue
                | RecordKind::ColumnFamilyMerge
                | RecordKind::SingleDeletion
                | RecordKind::ColumnFamilySingleDeletion
        )
    }
}

/// One decoded operation from a batch.
///
/// `key` and `value` borrow from the batch buffer. Copy them out to keep
/// them past the buffer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchRecord<'a> {
    pub kind: RecordKind,
    /// Target column family. 0 (the default family) for unqualified kinds.
    pub column_family: u32,
    pub key: &'a [u8],
    /// Empty for kinds without a value.
    pub value: &'a [u8],
}

/// Decode one record at the reader's position.
///
/// LogData is only understood when `allow_log_data` is set; otherwise its tag
/// is reported as unsupported like any unknown byte.
pub(crate) fn decode_record<'a>(
    reader: &mut Reader<'a>,
    allow_log_data: bool,
) -> Result<BatchRecord<'a>, DecodeError> {
    let offset = reader.position();
    let tag = reader.read_u8()?;
    let kind = match RecordKind::from_u8(tag) {
        Some(RecordKind::LogData) if !allow_log_data => None,
        other => other,
    }
    .ok_or(DecodeError::UnsupportedRecordType { tag, offset })?;

    let mut record = BatchRecord {
        kind,
        ..BatchRecord::default()
    };
    if kind.has_column_family() {
        record.column_family = reader.read_varint32()?;
    }
    if kind.has_key() {
        record.key = reader.read_length_prefixed()?;
    }
    if kind.has_value() {
        record.value = reader.read_length_prefixed()?;
    }
    Ok(record)
}
