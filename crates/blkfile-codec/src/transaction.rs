//! Transaction entries and whole transactions.
//!
//! Each decoder here is self-measuring: it reports the bytes it consumed so
//! the caller can advance its cursor without re-deriving lengths.

use std::cell::OnceCell;

use blkfile_types::{DecodeError, DecodeResult, Hash256};

use crate::script::{Script, ScriptShape};
use crate::varint;

/// One entry of a transaction's input list.
#[derive(Clone, Debug)]
pub struct TxInput {
    pub prev_tx_hash: Hash256,
    pub prev_tx_index: u32,
    pub script: Script,
    pub sequence: u32,
    /// Bytes this input occupied on the wire.
    pub consumed: usize,
}

impl TxInput {
    /// Decode one input from the front of `raw`.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < 36 {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: 36,
                available: raw.len(),
            });
        }

        let (script_len, varint_len) = varint::decode(&raw[36..]).map_err(|e| e.offset_by(36))?;
        let script_start = 36 + varint_len;
        let available = raw.len() - script_start;
        // The declared length is corruption-controlled; compare it in u64
        // before any usize arithmetic on it.
        if script_len.saturating_add(4) > available as u64 {
            return Err(DecodeError::Truncated {
                offset: script_start,
                needed: script_len.saturating_add(4).try_into().unwrap_or(usize::MAX),
                available,
            });
        }
        let script_len = script_len as usize;
        let consumed = script_start + script_len + 4;

        Ok(Self {
            prev_tx_hash: Hash256::from_wire(raw[0..32].try_into().unwrap()),
            prev_tx_index: u32::from_le_bytes(raw[32..36].try_into().unwrap()),
            script: Script::new(raw[script_start..script_start + script_len].to_vec()),
            sequence: u32::from_le_bytes(raw[consumed - 4..consumed].try_into().unwrap()),
            consumed,
        })
    }

    /// An input with the all-zero predecessor hash mints new value rather
    /// than spending an earlier output.
    pub fn is_coinbase(&self) -> bool {
        self.prev_tx_hash.is_null()
    }
}

/// One entry of a transaction's output list.
#[derive(Clone, Debug)]
pub struct TxOutput {
    pub value: u64,
    pub script: Script,
    /// Bytes this output occupied on the wire.
    pub consumed: usize,
    shape: OnceCell<ScriptShape>,
}

impl TxOutput {
    /// Decode one output from the front of `raw`.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < 8 {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: 8,
                available: raw.len(),
            });
        }

        let (script_len, varint_len) = varint::decode(&raw[8..]).map_err(|e| e.offset_by(8))?;
        let script_start = 8 + varint_len;
        let available = raw.len() - script_start;
        if script_len > available as u64 {
            return Err(DecodeError::Truncated {
                offset: script_start,
                needed: script_len.try_into().unwrap_or(usize::MAX),
                available,
            });
        }
        let script_len = script_len as usize;
        let consumed = script_start + script_len;

        Ok(Self {
            value: u64::from_le_bytes(raw[0..8].try_into().unwrap()),
            script: Script::new(raw[script_start..consumed].to_vec()),
            consumed,
            shape: OnceCell::new(),
        })
    }

    /// The lock script's shape, classified on first access and cached.
    pub fn shape(&self) -> ScriptShape {
        *self.shape.get_or_init(|| self.script.shape())
    }
}

/// One transaction: version, input list, output list, lock time.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    /// Bytes this transaction occupied on the wire.
    pub consumed: usize,
    /// Double-SHA-256 over exactly the transaction's wire span.
    pub txid: Hash256,
}

impl Transaction {
    /// Decode one transaction from the front of `raw`.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < 4 {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: 4,
                available: raw.len(),
            });
        }
        let version = i32::from_le_bytes(raw[0..4].try_into().unwrap());
        let mut offset = 4;

        let (input_count, varint_len) =
            varint::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
        offset += varint_len;
        let mut inputs = Vec::with_capacity(input_count.min(1024) as usize);
        for _ in 0..input_count {
            let input = TxInput::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
            offset += input.consumed;
            inputs.push(input);
        }

        let (output_count, varint_len) =
            varint::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
        offset += varint_len;
        let mut outputs = Vec::with_capacity(output_count.min(1024) as usize);
        for _ in 0..output_count {
            let output = TxOutput::decode(&raw[offset..]).map_err(|e| e.offset_by(offset))?;
            offset += output.consumed;
            outputs.push(output);
        }

        if raw.len() < offset + 4 {
            return Err(DecodeError::Truncated {
                offset,
                needed: 4,
                available: raw.len() - offset,
            });
        }
        let lock_time = u32::from_le_bytes(raw[offset..offset + 4].try_into().unwrap());
        let consumed = offset + 4;

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            consumed,
            txid: Hash256::double_sha256(&raw[..consumed]),
        })
    }

    /// A transaction is coinbase-like when any input mints rather than
    /// spends.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.iter().any(TxInput::is_coinbase)
    }
}
