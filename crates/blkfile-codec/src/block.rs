//! One magic-delimited frame body: header plus transaction list.

use blkfile_types::{DecodeError, DecodeResult};

use crate::header::{BlockHeader, HEADER_LEN};
use crate::transaction::Transaction;
use crate::varint;

/// The frame delimiter as a little-endian u32.
pub const MAGIC: u32 = 0xd9b4_bef9;
/// The frame delimiter as it appears on the wire.
pub const MAGIC_BYTES: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

/// Disagreement between a frame's declared size and the bytes its body
/// actually occupied. Non-fatal: the decoded block is still returned, and
/// strict callers reject it themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeMismatch {
    /// The size field following the magic.
    pub declared: u32,
    /// Bytes actually consumed from the header start to the end of the
    /// last transaction.
    pub actual: usize,
}

/// One decoded block frame.
#[derive(Clone, Debug)]
pub struct Block {
    pub magic: u32,
    /// The size field: bytes from just after it to the end of the last
    /// transaction.
    pub declared_size: u32,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Total bytes this frame occupied, including magic and size field.
    pub consumed: usize,
}

impl Block {
    /// Decode one frame from the front of `raw`.
    ///
    /// The declared size is cross-checked but never blocks the decode; see
    /// [`Block::size_mismatch`].
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < 8 {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: 8,
                available: raw.len(),
            });
        }
        let magic = u32::from_le_bytes(raw[0..4].try_into().unwrap());
        let declared_size = u32::from_le_bytes(raw[4..8].try_into().unwrap());

        // A declared size of zero still promises no header, so the frame is
        // truncated, not empty.
        if raw.len() < 8 + HEADER_LEN {
            return Err(DecodeError::Truncated {
                offset: 8,
                needed: HEADER_LEN,
                available: raw.len() - 8,
            });
        }
        let header = BlockHeader::decode(&raw[8..8 + HEADER_LEN])?;
        let mut offset = 8 + HEADER_LEN;

        let (tx_count, varint_len) =
            varint::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
        offset += varint_len;

        let mut transactions = Vec::with_capacity(tx_count.min(4096) as usize);
        for _ in 0..tx_count {
            let tx = Transaction::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
            offset += tx.consumed;
            transactions.push(tx);
        }

        tracing::debug!(
            hash = %header.hash,
            tx_count,
            consumed = offset,
            "decoded block frame"
        );

        Ok(Self {
            magic,
            declared_size,
            header,
            transactions,
            consumed: offset,
        })
    }

    /// The declared size against the body bytes actually consumed, when
    /// they disagree.
    pub fn size_mismatch(&self) -> Option<SizeMismatch> {
        let actual = self.consumed - 8;
        if self.declared_size as usize != actual {
            Some(SizeMismatch {
                declared: self.declared_size,
                actual,
            })
        } else {
            None
        }
    }

    /// Whether any transaction in this block is coinbase-like.
    pub fn has_coinbase(&self) -> bool {
        self.transactions.iter().any(Transaction::is_coinbase)
    }
}
