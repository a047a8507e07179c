//! Append-only byte stream with one producer and many cursors
//!
//! Semantics:
//! - Write: append under the write lock, then wake every blocked cursor
//! - Close: end-of-stream for cursors that drain everything; later writes fail
//! - Reset: truncate (capacity retained), reopen, and advance the epoch so
//!   cursors created earlier report discontinuity instead of stale bytes
//!
//! Inspection (length, capacity, snapshots, cursor copies) only takes the
//! read lock, so any number of cursors copy out in parallel.

use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use super::signal::Signal;
use super::Cursor;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Everything guarded by the stream lock.
pub(crate) struct State {
    pub(crate) buf: Vec<u8>,
    pub(crate) closed: bool,
    pub(crate) epoch: u64,
    /// Installed by the first cursor; nobody to wake before that.
    pub(crate) signal: Option<Arc<Signal>>,
}

impl State {
    #[inline]
    fn wake(&self) {
        if let Some(signal) = &self.signal {
            signal.broadcast();
        }
    }
}

pub(crate) struct Shared {
    state: RwLock<State>,
    config: StreamConfig,
}

impl Shared {
    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer-side handle.
///
/// Cloning is cheap and every clone refers to the same bytes. Storage lives
/// until the last `Stream` clone and the last [`Cursor`] are dropped.
#[derive(Clone)]
pub struct Stream {
    pub(crate) shared: Arc<Shared>,
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream {
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Stream reserving at least `bytes` on its first write.
    pub fn with_capacity(bytes: usize) -> Self {
        Self::with_config(StreamConfig::new().initial_capacity(bytes))
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State {
                    buf: Vec::new(),
                    closed: false,
                    epoch: 0,
                    signal: None,
                }),
                config,
            }),
        }
    }

    /// Append `data` and wake every blocked cursor.
    ///
    /// Empty input is a no-op returning `Ok(0)`, even on a closed stream.
    /// Fails with [`StreamError::Closed`] after [`close`](Self::close),
    /// leaving storage untouched. Never writes partially.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut state = self.shared.write();
        if state.closed {
            debug!("rejected {} byte write on closed stream", data.len());
            return Err(StreamError::Closed);
        }

        if state.buf.capacity() == 0 {
            let reserve = self.shared.config.initial_capacity.max(data.len());
            state.buf.reserve(reserve);
        }
        state.buf.extend_from_slice(data);
        state.wake();

        Ok(data.len())
    }

    /// Declare end-of-stream. Idempotent and always succeeds.
    pub fn close(&self) -> Result<()> {
        let mut state = self.shared.write();
        if !state.closed {
            state.closed = true;
            state.wake();
            debug!("stream closed at {} bytes", state.buf.len());
        }
        Ok(())
    }

    /// Discard the contents, keeping the allocation, and reopen for writing.
    ///
    /// Every cursor created before this call gets
    /// [`StreamError::Discontinued`] on its next read, even with unread
    /// bytes left.
    pub fn reset(&self) {
        let mut state = self.shared.write();
        state.closed = false;
        state.buf.clear();
        state.epoch = state.epoch.wrapping_add(1);
        state.wake();
        debug!(
            "stream reset to epoch {} (capacity {})",
            state.epoch,
            state.buf.capacity()
        );
    }

    /// Open a new reader positioned at the start of the current contents.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    pub fn len(&self) -> usize {
        self.shared.read().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.read().buf.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.read().closed
    }

    /// Owned copy of the bytes written so far.
    pub fn snapshot(&self) -> Vec<u8> {
        self.shared.read().buf.clone()
    }

    /// Bytes written so far as text. No transcoding: non UTF-8 contents
    /// fail with [`StreamError::InvalidText`].
    pub fn snapshot_text(&self) -> Result<String> {
        Ok(String::from_utf8(self.snapshot())?)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.read();
        f.debug_struct("Stream")
            .field("len", &state.buf.len())
            .field("capacity", &state.buf.capacity())
            .field("closed", &state.closed)
            .field("epoch", &state.epoch)
            .finish()
    }
}

impl io::Write for &Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Stream::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
