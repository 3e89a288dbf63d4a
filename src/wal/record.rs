use crate::batch::{HEADER_SIZE, WriteBatch};
use crate::coding::{decode_fixed32, put_fixed32};
use crate::error::{Error, Result};

/// A single framed batch in the WAL.
///
/// On-disk format:
/// ```text
/// ┌──────────┬─────────┬──────────────────────────────────────┐
/// │ CRC (4B) │ Len (4B)│ Batch (Len bytes, header included)   │
/// └──────────┴─────────┴──────────────────────────────────────┘
/// ```
///
/// CRC covers everything after the CRC field itself.
/// If CRC doesn't match on read, the frame was a partial write (crash mid-write)
/// and recovery stops here. All preceding frames are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub batch: WriteBatch,
}

const CRC_SIZE: usize = 4;
const LEN_SIZE: usize = 4;
const FRAME_HEADER_SIZE: usize = CRC_SIZE + LEN_SIZE;

impl WalRecord {
    pub fn new(batch: WriteBatch) -> Self {
        WalRecord { batch }
    }

    /// Serialize this frame to bytes (including CRC header).
    pub fn encode(&self) -> Result<Vec<u8>> {
        Self::encode_batch(&self.batch)
    }

    /// Frame `batch` without taking ownership of it.
    pub fn encode_batch(batch: &WriteBatch) -> Result<Vec<u8>> {
        let payload = batch.data();
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| Error::Corruption("batch too large for a WAL frame".into()))?;

        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        // CRC placeholder, filled once the rest is written
        buf.extend_from_slice(&[0u8; CRC_SIZE]);
        put_fixed32(&mut buf, payload_len);
        buf.extend_from_slice(payload);

        let crc = crc32fast::hash(&buf[CRC_SIZE..]);
        buf[..CRC_SIZE].copy_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Deserialize a frame from the front of `data`. Returns error if the
    /// frame is truncated, its CRC doesn't match, or the payload cannot be
    /// a batch.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (Some(stored_crc), Some(payload_len)) =
            (decode_fixed32(data), data.get(CRC_SIZE..).and_then(decode_fixed32))
        else {
            return Err(Error::Corruption("frame too short".into()));
        };

        let total_len = FRAME_HEADER_SIZE + payload_len as usize;
        if data.len() < total_len {
            return Err(Error::Corruption("frame truncated".into()));
        }

        let computed_crc = crc32fast::hash(&data[CRC_SIZE..total_len]);
        if stored_crc != computed_crc {
            return Err(Error::Corruption("CRC mismatch".into()));
        }

        if (payload_len as usize) < HEADER_SIZE {
            return Err(Error::Corruption("frame payload shorter than batch header".into()));
        }

        let batch = WriteBatch::from_bytes(data[FRAME_HEADER_SIZE..total_len].to_vec());
        Ok(WalRecord { batch })
    }

    /// Size of this frame when serialized on disk.
    pub fn encoded_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.batch.len()
    }
}
