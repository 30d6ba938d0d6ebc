//! Magic-aligned frame scanning over a flat buffer.

use blkfile_codec::{Block, MAGIC_BYTES};
use blkfile_types::DecodeError;
use thiserror::Error;
use tracing::{debug, warn};

/// A decoded frame together with the buffer offset of its magic marker.
#[derive(Clone, Debug)]
pub struct Frame {
    pub offset: usize,
    pub block: Block,
}

/// A frame that was located but failed to decode.
///
/// `offset` is the buffer position of the frame's magic marker; the source
/// error's own offset is relative to that frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("frame at offset {offset}: {source}")]
pub struct FrameError {
    pub offset: usize,
    #[source]
    pub source: DecodeError,
}

/// How scanning resumes after a frame fails to decode.
///
/// The declared size field is the only framing information that survives a
/// corrupt frame body. Trusting it avoids reinterpreting mid-record bytes
/// as a magic marker; callers that cannot trust it stop instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResyncPolicy {
    /// Skip `8 + declared_size` bytes past the failed frame and keep
    /// scanning. If even the size field is unreadable, the scan ends.
    #[default]
    TrustDeclaredSize,
    /// Yield the error and end the scan.
    StopOnError,
}

/// Forward-only scanner yielding every magic-delimited frame in a buffer.
///
/// Single-owner cursor: consuming the iterator advances the scan position
/// irreversibly. Positions that do not start with the magic marker are
/// skipped one byte at a time; the scan is terminal once fewer than four
/// bytes remain.
#[derive(Debug)]
pub struct BlockScanner<'a> {
    data: &'a [u8],
    offset: usize,
    policy: ResyncPolicy,
    done: bool,
}

impl<'a> BlockScanner<'a> {
    /// Scan `data` with the default resync policy.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_policy(data, ResyncPolicy::default())
    }

    /// Scan `data` with an explicit resync policy.
    pub fn with_policy(data: &'a [u8], policy: ResyncPolicy) -> Self {
        Self {
            data,
            offset: 0,
            policy,
            done: false,
        }
    }

    /// The current cursor position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Decode the frame at `self.offset`, which is known to start with the
    /// magic marker, and advance the cursor.
    fn decode_frame(&mut self) -> Result<Frame, FrameError> {
        let start = self.offset;
        let remaining = &self.data[start..];

        // The frame spans exactly 8 + declared_size bytes when the size
        // field is present; bound the decode to that span.
        let declared = (remaining.len() >= 8)
            .then(|| u32::from_le_bytes(remaining[4..8].try_into().unwrap()) as usize);
        let frame_len = declared
            .map(|size| 8usize.saturating_add(size).min(remaining.len()))
            .unwrap_or(remaining.len());

        match Block::decode(&remaining[..frame_len]) {
            Ok(block) => {
                if let Some(mismatch) = block.size_mismatch() {
                    warn!(
                        offset = start,
                        declared = mismatch.declared,
                        actual = mismatch.actual,
                        "frame size field disagrees with decoded length"
                    );
                }
                self.offset = start + frame_len;
                Ok(Frame {
                    offset: start,
                    block,
                })
            }
            Err(source) => {
                warn!(offset = start, error = %source, "frame failed to decode");
                match (self.policy, declared) {
                    (ResyncPolicy::TrustDeclaredSize, Some(size)) => {
                        self.offset = start
                            .saturating_add(8)
                            .saturating_add(size)
                            .min(self.data.len());
                    }
                    _ => self.done = true,
                }
                Err(FrameError {
                    offset: start,
                    source,
                })
            }
        }
    }
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while self.offset + 4 <= self.data.len() {
            if self.data[self.offset..self.offset + 4] == MAGIC_BYTES {
                debug!(offset = self.offset, "magic marker found");
                return Some(self.decode_frame());
            }
            self.offset += 1;
        }
        self.done = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blkfile_codec::varint;

    fn encode_header() -> Vec<u8> {
        let mut raw = Vec::with_capacity(80);
        raw.extend_from_slice(&1i32.to_le_bytes());
        raw.extend_from_slice(&[0x77; 32]);
        raw.extend_from_slice(&[0x44; 32]);
        raw.extend_from_slice(&1_293_623_863u32.to_le_bytes());
        raw.extend_from_slice(&0x1d00_ffffu32.to_le_bytes());
        raw.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        raw
    }

    fn encode_tx() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1i32.to_le_bytes());
        varint::encode(&mut raw, 1);
        raw.extend_from_slice(&[0u8; 32]);
        raw.extend_from_slice(&u32::MAX.to_le_bytes());
        varint::encode(&mut raw, 1);
        raw.push(0x51);
        raw.extend_from_slice(&0u32.to_le_bytes());
        varint::encode(&mut raw, 1);
        raw.extend_from_slice(&100u64.to_le_bytes());
        varint::encode(&mut raw, 1);
        raw.push(0x6a);
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw
    }

    fn encode_frame() -> Vec<u8> {
        let mut body = encode_header();
        varint::encode(&mut body, 1);
        body.extend_from_slice(&encode_tx());

        let mut raw = Vec::new();
        raw.extend_from_slice(&MAGIC_BYTES);
        raw.extend_from_slice(&(body.len() as u32).to_le_bytes());
        raw.extend_from_slice(&body);
        raw
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert_eq!(BlockScanner::new(&[]).count(), 0);
        assert_eq!(BlockScanner::new(&[0xf9, 0xbe, 0xb4]).count(), 0);
    }

    #[test]
    fn single_frame() {
        let buf = encode_frame();
        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        assert_eq!(frames.len(), 1);
        let frame = frames[0].as_ref().unwrap();
        assert_eq!(frame.offset, 0);
        assert_eq!(frame.block.consumed, buf.len());
    }

    #[test]
    fn two_back_to_back_frames() {
        let mut buf = encode_frame();
        buf.extend_from_slice(&encode_frame());
        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.is_ok()));
        let second = frames[1].as_ref().unwrap();
        assert_eq!(second.offset, buf.len() / 2);
        // No cross-frame validation: both headers carry the same
        // (unconstrained) predecessor hash.
        assert_eq!(
            frames[0].as_ref().unwrap().block.header.prev_block_hash,
            second.block.header.prev_block_hash
        );
    }

    #[test]
    fn resyncs_past_leading_garbage() {
        let mut buf = vec![0x00, 0xf9, 0xbe, 0x13, 0x37];
        let garbage = buf.len();
        buf.extend_from_slice(&encode_frame());
        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().offset, garbage);
    }

    #[test]
    fn truncated_frame_reports_error_and_scan_continues() {
        // Magic + declared size 0 + no header bytes, then a valid frame.
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC_BYTES);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&encode_frame());

        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        assert_eq!(frames.len(), 2);
        let err = frames[0].as_ref().unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(matches!(err.source, DecodeError::Truncated { .. }));
        assert_eq!(frames[1].as_ref().unwrap().offset, 8);
    }

    #[test]
    fn huge_script_length_in_frame_is_an_error_not_a_panic() {
        // A frame whose one transaction declares a u64::MAX-byte input
        // script: the scan must yield a FrameError and resync to the next
        // frame.
        let mut body = encode_header();
        varint::encode(&mut body, 1); // one transaction
        body.extend_from_slice(&1i32.to_le_bytes());
        varint::encode(&mut body, 1); // one input
        body.extend_from_slice(&[0u8; 32]);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(255);
        body.extend_from_slice(&u64::MAX.to_le_bytes());

        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC_BYTES);
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&body);
        let second_at = buf.len();
        buf.extend_from_slice(&encode_frame());

        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        assert_eq!(frames.len(), 2);
        let err = frames[0].as_ref().unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(matches!(err.source, DecodeError::Truncated { .. }));
        assert_eq!(frames[1].as_ref().unwrap().offset, second_at);
    }

    #[test]
    fn trust_declared_size_skips_corrupt_body() {
        // Frame whose body is ruined but whose size field still frames it.
        let mut first = encode_frame();
        let len = first.len();
        for byte in &mut first[88..len - 4] {
            *byte = 0xff;
        }
        let mut buf = first;
        buf.extend_from_slice(&encode_frame());

        let frames: Vec<_> =
            BlockScanner::with_policy(&buf, ResyncPolicy::TrustDeclaredSize).collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_err());
        let second = frames[1].as_ref().unwrap();
        assert_eq!(second.offset, buf.len() / 2);
    }

    #[test]
    fn stop_on_error_terminates_the_scan() {
        let mut first = encode_frame();
        let len = first.len();
        for byte in &mut first[88..len - 4] {
            *byte = 0xff;
        }
        let mut buf = first;
        buf.extend_from_slice(&encode_frame());

        let frames: Vec<_> = BlockScanner::with_policy(&buf, ResyncPolicy::StopOnError).collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_err());
    }

    #[test]
    fn size_field_promising_past_buffer_end_is_truncated() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC_BYTES);
        buf.extend_from_slice(&1_000u32.to_le_bytes());
        buf.extend_from_slice(&encode_header());
        let frames: Vec<_> = BlockScanner::new(&buf).collect();
        // The declared size runs past the buffer: the header still decodes
        // but the record count is missing, and resync lands past the end of
        // the data.
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_err());
    }

    #[test]
    fn scanner_is_forward_only() {
        let buf = encode_frame();
        let mut scanner = BlockScanner::new(&buf);
        assert_eq!(scanner.position(), 0);
        scanner.next().unwrap().unwrap();
        assert_eq!(scanner.position(), buf.len());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
