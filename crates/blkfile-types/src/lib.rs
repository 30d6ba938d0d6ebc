//! Foundation types for blkfile.
//!
//! This crate provides the wire-level hash type and the decode error shared
//! by every other blkfile crate.
//!
//! # Key Types
//!
//! - [`Hash256`] — 32-byte double-SHA-256 digest as it appears on the wire
//! - [`DecodeError`] — failure modes of the binary decoders

pub mod error;
pub mod hash;

pub use error::{DecodeError, DecodeResult};
pub use hash::Hash256;
