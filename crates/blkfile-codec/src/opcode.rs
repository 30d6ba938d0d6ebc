//! Opcode decoding for spending-condition byte programs.
//!
//! A script's raw bytes decode into a flat sequence of [`Op`] values:
//! data pushes (inline-length and PUSHDATA forms), small integers, and
//! named operations. Decoding happens once per script; classification is
//! pure pattern matching over the result.

use blkfile_types::{DecodeError, DecodeResult};

/// OP_0: push an empty byte string / the number 0.
pub const OP_0: u8 = 0x00;
/// OP_PUSHDATA1: one-byte length prefix.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// OP_PUSHDATA2: two-byte little-endian length prefix.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// OP_PUSHDATA4: four-byte little-endian length prefix.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// OP_1..OP_16 occupy 0x51..=0x60.
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
/// OP_RETURN: marks the program statically unspendable.
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;
/// OP_NOP10, the last assigned opcode; anything above it is unrecognized.
pub const OP_NOP10: u8 = 0xb9;

/// One decoded element of a byte program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// A data push, from either an inline length byte or a PUSHDATA form.
    Push(Vec<u8>),
    /// A small integer: OP_0 or OP_1..OP_16.
    Num(u8),
    /// Any other named operation, kept as its raw opcode byte.
    Code(u8),
}

impl Op {
    /// Returns `true` for a push whose bytes look like a public key:
    /// 65 bytes starting 0x04 (uncompressed) or 33 bytes starting
    /// 0x02/0x03 (compressed).
    pub fn is_public_key(&self) -> bool {
        match self {
            Op::Push(data) => {
                (data.len() == 65 && data[0] == 0x04)
                    || (data.len() == 33 && (data[0] == 0x02 || data[0] == 0x03))
            }
            _ => false,
        }
    }
}

/// Decode a whole byte program into its op sequence.
///
/// Fails with `MalformedScript` on an unrecognized opcode or a push whose
/// declared length runs past the end of the program.
pub fn decode_ops(raw: &[u8]) -> DecodeResult<Vec<Op>> {
    let mut ops = Vec::new();
    let mut pos = 0;

    while pos < raw.len() {
        let byte = raw[pos];
        let op_offset = pos;
        pos += 1;

        let op = match byte {
            OP_0 => Op::Num(0),
            1..=0x4b => {
                let len = byte as usize;
                Op::Push(take_push(raw, &mut pos, len, op_offset)?)
            }
            OP_PUSHDATA1 => {
                let len = read_push_len(raw, &mut pos, 1, op_offset)?;
                Op::Push(take_push(raw, &mut pos, len, op_offset)?)
            }
            OP_PUSHDATA2 => {
                let len = read_push_len(raw, &mut pos, 2, op_offset)?;
                Op::Push(take_push(raw, &mut pos, len, op_offset)?)
            }
            OP_PUSHDATA4 => {
                let len = read_push_len(raw, &mut pos, 4, op_offset)?;
                Op::Push(take_push(raw, &mut pos, len, op_offset)?)
            }
            OP_1..=OP_16 => Op::Num(byte - OP_1 + 1),
            _ if byte > OP_NOP10 => {
                return Err(DecodeError::MalformedScript {
                    offset: op_offset,
                    reason: format!("unrecognized opcode 0x{byte:02x}"),
                });
            }
            _ => Op::Code(byte),
        };
        ops.push(op);
    }

    Ok(ops)
}

fn read_push_len(raw: &[u8], pos: &mut usize, width: usize, op_offset: usize) -> DecodeResult<usize> {
    if raw.len() - *pos < width {
        return Err(DecodeError::MalformedScript {
            offset: op_offset,
            reason: format!("push length prefix needs {width} bytes"),
        });
    }
    let mut len_bytes = [0u8; 4];
    len_bytes[..width].copy_from_slice(&raw[*pos..*pos + width]);
    *pos += width;
    Ok(u32::from_le_bytes(len_bytes) as usize)
}

fn take_push(raw: &[u8], pos: &mut usize, len: usize, op_offset: usize) -> DecodeResult<Vec<u8>> {
    if raw.len() - *pos < len {
        return Err(DecodeError::MalformedScript {
            offset: op_offset,
            reason: format!("push of {len} bytes exceeds remaining {}", raw.len() - *pos),
        });
    }
    let data = raw[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_push() {
        let ops = decode_ops(&[0x03, 0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(ops, vec![Op::Push(vec![0xaa, 0xbb, 0xcc])]);
    }

    #[test]
    fn pushdata1() {
        let mut raw = vec![OP_PUSHDATA1, 0x02];
        raw.extend_from_slice(&[0x11, 0x22]);
        let ops = decode_ops(&raw).unwrap();
        assert_eq!(ops, vec![Op::Push(vec![0x11, 0x22])]);
    }

    #[test]
    fn pushdata2() {
        let mut raw = vec![OP_PUSHDATA2, 0x00, 0x01];
        raw.extend_from_slice(&[0u8; 256]);
        let ops = decode_ops(&raw).unwrap();
        assert_eq!(ops, vec![Op::Push(vec![0u8; 256])]);
    }

    #[test]
    fn small_integers() {
        let ops = decode_ops(&[OP_0, OP_1, OP_16]).unwrap();
        assert_eq!(ops, vec![Op::Num(0), Op::Num(1), Op::Num(16)]);
    }

    #[test]
    fn named_operations() {
        let ops = decode_ops(&[OP_DUP, OP_HASH160, OP_CHECKSIG]).unwrap();
        assert_eq!(
            ops,
            vec![Op::Code(OP_DUP), Op::Code(OP_HASH160), Op::Code(OP_CHECKSIG)]
        );
    }

    #[test]
    fn truncated_inline_push_is_malformed() {
        let err = decode_ops(&[0x05, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedScript { offset: 0, .. }
        ));
    }

    #[test]
    fn truncated_pushdata_length_is_malformed() {
        let err = decode_ops(&[OP_DUP, OP_PUSHDATA2, 0x05]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedScript { offset: 1, .. }
        ));
    }

    #[test]
    fn unassigned_opcode_is_malformed() {
        let err = decode_ops(&[0xfe]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedScript { offset: 0, .. }));
    }

    #[test]
    fn empty_program_decodes_to_no_ops() {
        assert!(decode_ops(&[]).unwrap().is_empty());
    }

    #[test]
    fn public_key_predicate() {
        let mut uncompressed = vec![0x04];
        uncompressed.extend_from_slice(&[0u8; 64]);
        assert!(Op::Push(uncompressed).is_public_key());

        let mut compressed = vec![0x02];
        compressed.extend_from_slice(&[0u8; 32]);
        assert!(Op::Push(compressed).is_public_key());

        let mut odd_compressed = vec![0x03];
        odd_compressed.extend_from_slice(&[0u8; 32]);
        assert!(Op::Push(odd_compressed).is_public_key());

        // Wrong prefix or wrong length.
        assert!(!Op::Push(vec![0x04; 33]).is_public_key());
        assert!(!Op::Push(vec![0x02; 65]).is_public_key());
        assert!(!Op::Num(2).is_public_key());
        assert!(!Op::Code(OP_CHECKSIG).is_public_key());
    }
}
