use crate::batch::HEADER_SIZE;
use crate::batch::record::{BatchRecord, decode_record};
use crate::coding::{Reader, decode_fixed32};
use crate::error::DecodeError;

/// Knobs for a decode pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Compare the header's record count against the number of data records
    /// decoded once input runs out. A mismatch becomes a sticky
    /// [`DecodeError::CountMismatch`]. Off by default.
    pub verify_count: bool,
}

/// Pull decoder over a serialized write batch.
///
/// Skips the 12-byte header, then decodes one record per [`advance`] call
/// until input runs out or a record fails to decode. Failures are sticky:
/// once [`error`] is set the decoder yields nothing more. A decoder makes
/// exactly one pass; build a new one to iterate again.
///
/// Input shorter than the header decodes as an empty batch with no error.
///
/// ```text
/// ┌──────────────┬────────────┬──────────┬──────────┬─────┐
/// │ sequence (8B)│ count (4B) │ record 0 │ record 1 │ ... │
/// └──────────────┴────────────┴──────────┴──────────┴─────┘
///  skipped        checked only with verify_count
/// ```
///
/// [`advance`]: BatchIterator::advance
/// [`error`]: BatchIterator::error
#[derive(Debug)]
pub struct BatchIterator<'a> {
    reader: Reader<'a>,
    record: BatchRecord<'a>,
    error: Option<DecodeError>,
    /// Header count still awaiting verification.
    expected_count: Option<u32>,
    data_records: u32,
    error_reported: bool,
}

impl<'a> BatchIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> Self {
        let (data, expected_count) = if data.len() < HEADER_SIZE {
            (&data[..0], None)
        } else {
            let count = decode_fixed32(&data[8..HEADER_SIZE]);
            (data, count.filter(|_| options.verify_count))
        };

        BatchIterator {
            reader: Reader::new(data, HEADER_SIZE),
            record: BatchRecord::default(),
            error: None,
            expected_count,
            data_records: 0,
            error_reported: false,
        }
    }

    /// Decode the next record. Returns false when input is exhausted or a
    /// decode error is (or already was) hit; check [`error`] to tell which.
    ///
    /// On failure the current record is left as it was.
    ///
    /// [`error`]: BatchIterator::error
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }

        if self.reader.is_empty() {
            if let Some(expected) = self.expected_count.take() {
                if expected != self.data_records {
                    self.fail(DecodeError::CountMismatch {
                        expected,
                        found: self.data_records,
                    });
                }
            }
            return false;
        }

        let mut reader = self.reader;
        match decode_record(&mut reader, false) {
            Ok(record) => {
                self.reader = reader;
                self.record = record;
                if record.kind.is_data() {
                    self.data_records += 1;
                }
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    /// The last successfully decoded record, or the zero-valued record if
    /// none has been decoded yet.
    pub fn record(&self) -> &BatchRecord<'a> {
        &self.record
    }

    /// The sticky decode error, if any.
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Absolute offset of the cursor in the batch buffer.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    fn fail(&mut self, err: DecodeError) {
        tracing::debug!(offset = self.reader.position(), error = %err, "batch decode failed");
        self.error = Some(err);
    }
}

/// Yields each record, then the sticky error once if there is one.
impl<'a> Iterator for BatchIterator<'a> {
    type Item = Result<BatchRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return Some(Ok(self.record));
        }
        match &self.error {
            Some(err) if !self.error_reported => {
                self.error_reported = true;
                Some(Err(err.clone()))
            }
            _ => None,
        }
    }
}
