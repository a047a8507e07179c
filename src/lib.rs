//! Fanbuf - single-writer, many-reader in-memory byte stream
//!
//! One producer appends to a [`Stream`]; any number of [`Cursor`]s read it
//! back at their own pace, each from the beginning.
//!
//! ```
//! use fanbuf::{Stream, StreamError};
//!
//! let stream = Stream::new();
//! let mut early = stream.cursor();
//! stream.write(b"hello ").unwrap();
//! stream.write(b"world").unwrap();
//! stream.close().unwrap();
//!
//! let mut buf = [0u8; 32];
//! let n = early.read(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"hello world");
//! assert!(matches!(early.read(&mut buf), Err(StreamError::EndOfStream)));
//! ```

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::StreamConfig;
pub use crate::core::{Cursor, Stream};
pub use crate::error::{Result, StreamError};
