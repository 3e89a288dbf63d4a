// Write batch decoder tests
// Pull-based decoding of serialized batches: records, sticky errors, options.

use batchlog::batch::HEADER_SIZE;
use batchlog::{BatchIterator, BatchRecord, DecodeError, DecodeOptions, RecordKind, WriteBatch};

/// Bytes of an empty batch header followed by `body`.
fn raw_batch(body: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_SIZE];
    data.extend_from_slice(body);
    data
}

// =============================================================================
// Test 1: Put, Put, Delete decode in order, then clean exhaustion
// =============================================================================
#[test]
fn put_put_delete_scenario() {
    let mut batch = WriteBatch::new();
    batch.put(b"key1", b"value1");
    batch.put(b"key2", b"value2");
    batch.delete(b"key3");
    assert_eq!(batch.count(), 3);

    let mut iter = batch.iter();

    assert!(iter.advance());
    let record = iter.record();
    assert_eq!(record.kind, RecordKind::Value);
    assert_eq!(record.key, b"key1");
    assert_eq!(record.value, b"value1");

    assert!(iter.advance());
    let record = iter.record();
    assert_eq!(record.kind, RecordKind::Value);
    assert_eq!(record.key, b"key2");
    assert_eq!(record.value, b"value2");

    assert!(iter.advance());
    let record = iter.record();
    assert_eq!(record.kind, RecordKind::Deletion);
    assert_eq!(record.key, b"key3");
    assert!(record.value.is_empty());

    assert!(!iter.advance());
    assert!(iter.error().is_none());
}

// =============================================================================
// Test 2: Empty batch yields nothing and no error
// =============================================================================
#[test]
fn empty_batch_yields_nothing() {
    let batch = WriteBatch::new();
    let mut iter = batch.iter();

    assert!(!iter.advance());
    assert!(iter.error().is_none());
    assert_eq!(*iter.record(), BatchRecord::default());
}

// =============================================================================
// Test 3: Input shorter than the header is an empty batch, not an error
// =============================================================================
#[test]
fn short_input_is_lenient() {
    for len in 0..HEADER_SIZE {
        let data = vec![0x01; len];
        let mut iter = BatchIterator::new(&data);
        assert!(!iter.advance(), "len {len}");
        assert!(iter.error().is_none(), "len {len}");
    }
}

// =============================================================================
// Test 4: Unknown tag stops decoding, earlier records survive
// =============================================================================
#[test]
fn unsupported_tag_halts_cleanly() {
    let mut batch = WriteBatch::new();
    batch.put(b"a", b"1");
    batch.merge(b"b", b"2");
    let bad_offset = batch.len();

    let mut data = batch.into_bytes();
    data.push(0x0E);
    data.extend_from_slice(b"\x01c");

    let mut iter = BatchIterator::new(&data);
    assert!(iter.advance());
    assert_eq!(iter.record().kind, RecordKind::Value);
    assert!(iter.advance());
    assert_eq!(iter.record().kind, RecordKind::Merge);
    assert_eq!(iter.record().key, b"b");

    assert!(!iter.advance());
    assert_eq!(
        iter.error(),
        Some(&DecodeError::UnsupportedRecordType {
            tag: 0x0E,
            offset: bad_offset
        })
    );
}

// =============================================================================
// Test 5: Log data is not decodable by the pull decoder
// =============================================================================
#[test]
fn log_data_is_unsupported() {
    let mut batch = WriteBatch::new();
    batch.put(b"k", b"v");
    let offset = batch.len();
    batch.put_log_data(b"blob");
    batch.put(b"after", b"log");

    let mut iter = batch.iter();
    assert!(iter.advance());
    assert!(!iter.advance());
    assert_eq!(
        iter.error(),
        Some(&DecodeError::UnsupportedRecordType { tag: 0x03, offset })
    );
}

// =============================================================================
// Test 6: Column family indices survive interleaving
// =============================================================================
#[test]
fn column_family_indices_in_order() {
    let mut batch = WriteBatch::new();
    batch.put_cf(0, b"k0", b"v0");
    batch.put_cf(1, b"k1", b"v1");
    batch.delete_cf(2, b"k2");
    batch.merge_cf(1, b"k3", b"v3");
    batch.single_delete_cf(2, b"k4");
    batch.delete_cf(0, b"k5");
    batch.put_cf(300, b"k6", b"v6");

    let records: Vec<BatchRecord> = batch.iter().map(|r| r.unwrap()).collect();
    let summary: Vec<(RecordKind, u32, &[u8])> = records
        .iter()
        .map(|r| (r.kind, r.column_family, r.key))
        .collect();

    assert_eq!(
        summary,
        vec![
            (RecordKind::Value, 0, &b"k0"[..]),
            (RecordKind::ColumnFamilyValue, 1, &b"k1"[..]),
            (RecordKind::ColumnFamilyDeletion, 2, &b"k2"[..]),
            (RecordKind::ColumnFamilyMerge, 1, &b"k3"[..]),
            (RecordKind::ColumnFamilySingleDeletion, 2, &b"k4"[..]),
            (RecordKind::Deletion, 0, &b"k5"[..]),
            (RecordKind::ColumnFamilyValue, 300, &b"k6"[..]),
        ]
    );
    assert_eq!(records[3].value, b"v3");
    assert_eq!(records.len() as u32, batch.count());
}

// =============================================================================
// Test 7: Errors are sticky and the record keeps its last good value
// =============================================================================
#[test]
fn error_is_sticky() {
    let data = raw_batch(b"\x01\x01k\x01v\x00\x09ab");
    let mut iter = BatchIterator::new(&data);

    assert!(iter.advance());
    let good = *iter.record();
    let position = iter.position();

    assert!(!iter.advance());
    let err = iter.error().cloned().unwrap();
    assert_eq!(err, DecodeError::ShortBuffer { offset: position + 2 });

    for _ in 0..3 {
        assert!(!iter.advance());
        assert_eq!(iter.error(), Some(&err));
        assert_eq!(*iter.record(), good);
        assert_eq!(iter.position(), position);
    }
}

// =============================================================================
// Test 8: Truncated varint and oversized length are short-buffer errors
// =============================================================================
#[test]
fn truncated_fields_are_short_buffer() {
    // CF value whose column family varint never terminates
    let data = raw_batch(&[0x05, 0x80]);
    let mut iter = BatchIterator::new(&data);
    assert!(!iter.advance());
    assert_eq!(iter.error(), Some(&DecodeError::ShortBuffer { offset: 14 }));

    // Deletion whose key claims 5 bytes but has 1
    let data = raw_batch(&[0x00, 0x05, b'a']);
    let mut iter = BatchIterator::new(&data);
    assert!(!iter.advance());
    assert_eq!(iter.error(), Some(&DecodeError::ShortBuffer { offset: 14 }));

    // Put with a key but no value length at all
    let data = raw_batch(&[0x01, 0x01, b'k']);
    let mut iter = BatchIterator::new(&data);
    assert!(!iter.advance());
    assert_eq!(iter.error(), Some(&DecodeError::ShortBuffer { offset: 15 }));
}

// =============================================================================
// Test 9: Column family index wider than 32 bits is malformed
// =============================================================================
#[test]
fn wide_column_family_is_malformed() {
    let data = raw_batch(&[0x04, 0x80, 0x80, 0x80, 0x80, 0x10, 0x01, b'k']);
    let mut iter = BatchIterator::new(&data);
    assert!(!iter.advance());
    assert_eq!(iter.error(), Some(&DecodeError::MalformedVarint { offset: 13 }));
}

// =============================================================================
// Test 10: Hand-built bytes decode with borrowed key/value
// =============================================================================
#[test]
fn decodes_hand_built_buffer() {
    let data = raw_batch(b"\x01\x02k1\x00\x07\x03xid\x0a\x0d\x7f");
    let mut iter = BatchIterator::new(&data);

    assert!(iter.advance());
    let record = *iter.record();
    assert_eq!(record.kind, RecordKind::Value);
    assert_eq!(record.key, b"k1");
    assert!(record.value.is_empty());
    // borrowed straight out of the buffer
    assert_eq!(record.key.as_ptr(), data[14..].as_ptr());

    assert!(iter.advance());
    assert_eq!(iter.record().kind, RecordKind::SingleDeletion);
    assert_eq!(iter.record().key, b"xid");

    for kind in [RecordKind::EndPrepareXid, RecordKind::Noop, RecordKind::NotUsed] {
        assert!(iter.advance());
        assert_eq!(iter.record().kind, kind);
        assert!(iter.record().key.is_empty());
    }

    assert!(!iter.advance());
    assert!(iter.error().is_none());
    assert_eq!(iter.position(), data.len());
}

// =============================================================================
// Test 11: Transaction markers decode with their xids
// =============================================================================
#[test]
fn transaction_markers() {
    let mut batch = WriteBatch::new();
    batch.mark_begin_prepare(b"tx1");
    batch.put(b"k", b"v");
    batch.mark_end_prepare();
    batch.mark_commit(b"tx1");
    batch.mark_rollback(b"tx2");
    batch.mark_noop();
    assert_eq!(batch.count(), 1);

    let kinds: Vec<(RecordKind, Vec<u8>)> = batch
        .iter()
        .map(|r| r.unwrap())
        .map(|r| (r.kind, r.key.to_vec()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            (RecordKind::BeginPrepareXid, b"tx1".to_vec()),
            (RecordKind::Value, b"k".to_vec()),
            (RecordKind::EndPrepareXid, Vec::new()),
            (RecordKind::CommitXid, b"tx1".to_vec()),
            (RecordKind::RollbackXid, b"tx2".to_vec()),
            (RecordKind::Noop, Vec::new()),
        ]
    );
}

// =============================================================================
// Test 12: Count verification is opt-in
// =============================================================================
#[test]
fn count_verification_is_opt_in() {
    let mut batch = WriteBatch::new();
    batch.put(b"a", b"1");
    batch.delete(b"b");

    let mut data = batch.into_bytes();
    data[8..12].copy_from_slice(&3u32.to_le_bytes());

    let lenient: Vec<_> = BatchIterator::new(&data).collect();
    assert_eq!(lenient.len(), 2);
    assert!(lenient.iter().all(|r| r.is_ok()));

    let options = DecodeOptions { verify_count: true };
    let mut iter = BatchIterator::with_options(&data, options);
    assert!(iter.advance());
    assert!(iter.advance());
    assert!(!iter.advance());
    assert_eq!(
        iter.error(),
        Some(&DecodeError::CountMismatch {
            expected: 3,
            found: 2
        })
    );
}

// =============================================================================
// Test 13: Count verification ignores markers that don't bump the count
// =============================================================================
#[test]
fn count_verification_passes_with_markers() {
    let mut batch = WriteBatch::new();
    batch.mark_begin_prepare(b"tx");
    batch.put(b"a", b"1");
    batch.single_delete(b"b");
    batch.mark_end_prepare();
    batch.mark_noop();

    let mut iter = batch.iter_with(DecodeOptions { verify_count: true });
    let mut seen = 0;
    while iter.advance() {
        seen += 1;
    }
    assert_eq!(seen, 5);
    assert!(iter.error().is_none());
}

// =============================================================================
// Test 14: Iterator adapter yields records, then the error once
// =============================================================================
#[test]
fn iterator_yields_error_once() {
    let mut batch = WriteBatch::new();
    batch.put(b"a", b"1");
    let mut data = batch.into_bytes();
    data.push(0x42);

    let mut iter = BatchIterator::new(&data);
    let first = iter.next().unwrap().unwrap();
    assert_eq!(first.key, b"a");

    let err = iter.next().unwrap().unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnsupportedRecordType {
            tag: 0x42,
            offset: data.len() - 1
        }
    );

    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
    assert!(iter.error().is_some());
}
