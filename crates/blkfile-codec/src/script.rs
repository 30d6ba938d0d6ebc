//! Spending-condition programs and their shape classification.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::opcode::{
    self, Op, OP_CHECKMULTISIG, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160,
    OP_RETURN,
};

/// Programs longer than this are unspendable by consensus convention.
const MAX_SCRIPT_SIZE: usize = 10_000;

/// The recognized spending-condition shapes.
///
/// Every byte program maps to exactly one shape; programs whose op sequence
/// fails to decode fall through to [`ScriptShape::Unknown`] unless a
/// raw-byte pattern (script-hash, unspendable) still applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptShape {
    PayToPubkey,
    PayToPubkeyHash,
    PayToScriptHash,
    MultiSig,
    Unspendable,
    Unknown,
}

impl fmt::Display for ScriptShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PayToPubkey => "pubkey",
            Self::PayToPubkeyHash => "pubkeyhash",
            Self::PayToScriptHash => "scripthash",
            Self::MultiSig => "multisig",
            Self::Unspendable => "unspendable",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// An immutable byte program with its memoized op sequence.
///
/// The op sequence is decoded on first use and shared by all classification
/// checks; a failed decode is remembered as `None` so malformed programs
/// are not re-parsed per check.
#[derive(Clone, Debug)]
pub struct Script {
    raw: Vec<u8>,
    ops: OnceCell<Option<Vec<Op>>>,
}

impl Script {
    /// Wrap raw program bytes. No decoding happens until [`Script::ops`]
    /// or a classification check needs it.
    pub fn new(raw: Vec<u8>) -> Self {
        Self {
            raw,
            ops: OnceCell::new(),
        }
    }

    /// The raw program bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The decoded op sequence, or `None` if the program is malformed.
    pub fn ops(&self) -> Option<&[Op]> {
        self.ops
            .get_or_init(|| opcode::decode_ops(&self.raw).ok())
            .as_deref()
    }

    /// Classify this program into its shape. Total: never fails.
    ///
    /// Checks run in precedence order; the first match wins. Checks that
    /// need the op sequence treat a malformed program as a non-match, so
    /// malformed programs end up `Unknown` unless a raw-byte pattern
    /// applies.
    pub fn shape(&self) -> ScriptShape {
        if self.is_pubkey_hash() {
            ScriptShape::PayToPubkeyHash
        } else if self.is_pubkey() {
            ScriptShape::PayToPubkey
        } else if self.is_script_hash() {
            ScriptShape::PayToScriptHash
        } else if self.is_multisig() {
            ScriptShape::MultiSig
        } else if self.is_unspendable() {
            ScriptShape::Unspendable
        } else {
            ScriptShape::Unknown
        }
    }

    /// DUP HASH160 <20-byte hash> EQUALVERIFY CHECKSIG, always 25 raw bytes.
    fn is_pubkey_hash(&self) -> bool {
        if self.raw.len() != 25 {
            return false;
        }
        match self.ops() {
            Some([first, second, .., second_last, last]) => {
                *first == Op::Code(OP_DUP)
                    && *second == Op::Code(OP_HASH160)
                    && *second_last == Op::Code(OP_EQUALVERIFY)
                    && *last == Op::Code(OP_CHECKSIG)
            }
            _ => false,
        }
    }

    /// <pubkey> CHECKSIG.
    fn is_pubkey(&self) -> bool {
        match self.ops() {
            Some([key, Op::Code(OP_CHECKSIG)]) => key.is_public_key(),
            _ => false,
        }
    }

    /// HASH160 <20-byte hash> EQUAL — checked on the raw bytes, which is
    /// how the canonical pattern is defined.
    fn is_script_hash(&self) -> bool {
        self.raw.len() == 23
            && self.raw[0] == OP_HASH160
            && self.raw[1] == 0x14
            && self.raw[22] == OP_EQUAL
    }

    /// m <pubkey>*m .. n CHECKMULTISIG with n >= m.
    fn is_multisig(&self) -> bool {
        let ops = match self.ops() {
            Some(ops) if ops.len() >= 4 => ops,
            _ => return false,
        };
        let m = match ops[0] {
            Op::Num(m) => m as usize,
            _ => return false,
        };
        if m == 0 || ops.len() < m + 3 {
            return false;
        }
        if !ops[1..1 + m].iter().all(Op::is_public_key) {
            return false;
        }
        let n = match ops[ops.len() - 2] {
            Op::Num(n) => n as usize,
            _ => return false,
        };
        n >= m && ops[ops.len() - 1] == Op::Code(OP_CHECKMULTISIG)
    }

    /// Starts with OP_RETURN, or too large to ever execute.
    fn is_unspendable(&self) -> bool {
        self.raw.first() == Some(&OP_RETURN) || self.raw.len() > MAX_SCRIPT_SIZE
    }
}
