//! Frame scanner for archival block files.
//!
//! [`BlockScanner`] walks a flat byte buffer (typically a memory-mapped
//! file), locates magic-delimited frames, and yields each decoded block
//! together with its byte offset. Decode failures are reported per frame;
//! how scanning resumes afterwards is a [`ResyncPolicy`] choice.

pub mod scanner;

pub use scanner::{BlockScanner, Frame, FrameError, ResyncPolicy};
