//! Wire decoders for archival block files.
//!
//! Every decoder in this crate takes a borrowed byte slice, consumes a
//! prefix of it, and reports exactly how many bytes it consumed so the
//! caller can advance an explicit cursor. Decoding is all-or-nothing per
//! structure: a decoder either returns a fully populated value or fails
//! with a [`DecodeError`](blkfile_types::DecodeError) carrying the offset
//! and the expected-vs-available byte counts.
//!
//! # Architecture
//!
//! - **varint**: the self-describing variable-length integer used by every
//!   count and length field
//! - **opcode / script**: byte programs decoded into a tagged op sequence
//!   and classified into a fixed set of spending-condition shapes
//! - **header**: the fixed 80-byte block header
//! - **transaction**: inputs, outputs, and whole transactions, each
//!   self-measuring
//! - **block**: one magic-delimited frame body (header + transaction list)

pub mod block;
pub mod header;
pub mod opcode;
pub mod script;
pub mod transaction;
pub mod varint;

pub use block::{Block, SizeMismatch, MAGIC, MAGIC_BYTES};
pub use header::BlockHeader;
pub use opcode::Op;
pub use script::{Script, ScriptShape};
pub use transaction::{Transaction, TxInput, TxOutput};
