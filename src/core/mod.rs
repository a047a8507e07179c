//! Core module: shared byte stream with independent cursors
//!
//! Design principles:
//! - Write once, read many: cursors share one buffer, nothing is copied per reader
//! - Late joiners: a cursor opened at any time starts from byte 0
//! - Parallel readers: copies take the read lock only
//! - No polling: blocked cursors sleep until a write, close, or reset

mod cursor;
mod signal;
mod stream;

pub use cursor::Cursor;
pub use stream::Stream;
