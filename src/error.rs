use std::io;

use thiserror::Error;

/// Error recorded by a batch decoder.
///
/// Offsets are absolute positions in the batch buffer, header included.
/// Every variant is terminal for the decode pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A length prefix points past the end of input, or a varint runs off the end.
    #[error("short buffer at offset {offset}")]
    ShortBuffer { offset: usize },
    /// A varint terminated but does not fit the integer it encodes.
    #[error("malformed varint at offset {offset}")]
    MalformedVarint { offset: usize },
    /// The record tag is not one this decoder handles.
    #[error("unsupported record type {tag:#04x} at offset {offset}")]
    UnsupportedRecordType { tag: u8, offset: usize },
    /// Header count and decoded record count disagree.
    #[error("record count mismatch: header says {expected}, decoded {found}")]
    CountMismatch { expected: u32, found: u32 },
}

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error from WAL file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A batch failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Data corruption detected (CRC mismatch, bad framing, wrong count).
    #[error("corruption: {0}")]
    Corruption(String),
    /// A handler was given an operation it does not implement.
    #[error("{0} not supported by handler")]
    NotSupported(&'static str),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
