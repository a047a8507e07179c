//! Independent reader over a [`Stream`]
//!
//! A cursor owns no bytes: only an offset and the epoch it was opened in.
//! Reads block until one of these holds:
//! - the stream has bytes past the offset
//! - the stream is closed
//! - the stream was reset since the cursor was opened

use std::fmt;
use std::io;
use std::sync::Arc;

use log::trace;

use super::signal::Signal;
use super::stream::Shared;
use super::Stream;
use crate::error::{Result, StreamError};

pub struct Cursor {
    shared: Arc<Shared>,
    signal: Arc<Signal>,
    offset: usize,
    epoch: u64,
}

impl Cursor {
    /// Open a cursor at offset 0 of the stream's current contents.
    ///
    /// The first cursor installs the stream's wake-up signal.
    pub fn new(stream: &Stream) -> Self {
        let shared = Arc::clone(&stream.shared);
        let (signal, epoch) = {
            let mut state = shared.write();
            let signal = Arc::clone(state.signal.get_or_insert_with(|| Arc::new(Signal::new())));
            (signal, state.epoch)
        };
        trace!("cursor opened at epoch {}", epoch);

        Self {
            shared,
            signal,
            offset: 0,
            epoch,
        }
    }

    /// Copy the next bytes into `buf`, blocking until there is something to
    /// report.
    ///
    /// Returns the number of bytes copied, [`StreamError::EndOfStream`] once
    /// a closed stream is drained (and on every read after), or
    /// [`StreamError::Discontinued`] if the stream was reset. Discontinuity
    /// wins over unread bytes: stale data is never handed out.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            // Sampled before the state check so a concurrent write can't slip
            // between the check and the wait.
            let seen = self.signal.generation();
            {
                let state = self.shared.read();

                if state.epoch != self.epoch {
                    trace!("cursor at {} discontinued", self.offset);
                    return Err(StreamError::Discontinued);
                }

                let pending = state.buf.get(self.offset..).unwrap_or_default();
                if pending.is_empty() && state.closed {
                    return Err(StreamError::EndOfStream);
                }

                if !pending.is_empty() {
                    let n = pending.len().min(buf.len());
                    buf[..n].copy_from_slice(&pending[..n]);
                    self.offset += n;
                    trace!("cursor read {} bytes, offset {}", n, self.offset);
                    return Ok(n);
                }
            }
            self.signal.wait_past(seen);
        }
    }

    /// Bytes consumed so far in this cursor's epoch.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True once the stream has been reset after this cursor was opened.
    /// Never blocks.
    pub fn is_stale(&self) -> bool {
        self.shared.read().epoch != self.epoch
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl io::Read for Cursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Cursor::read(self, buf) {
            Err(StreamError::EndOfStream) => Ok(0),
            other => other.map_err(io::Error::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn read_chunk(cursor: &mut Cursor) -> Result<Vec<u8>> {
        let mut buf = [0u8; 64];
        let n = cursor.read(&mut buf)?;
        Ok(buf[..n].to_vec())
    }

    #[test]
    fn test_first_cursor_installs_signal() {
        let stream = Stream::new();
        assert!(stream.shared.read().signal.is_none());

        let a = stream.cursor();
        let b = stream.cursor();
        assert!(Arc::ptr_eq(&a.signal, &b.signal));
    }

    #[test]
    fn test_late_cursor_sees_history() {
        let stream = Stream::new();
        stream.write(b"aa").unwrap();
        stream.write(b"bb").unwrap();

        let mut cursor = stream.cursor();
        assert_eq!(read_chunk(&mut cursor).unwrap(), b"aabb");
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn test_small_buffer_reads_in_order() {
        let stream = Stream::new();
        stream.write(b"abcdefg").unwrap();
        stream.close().unwrap();

        let mut cursor = stream.cursor();
        let mut buf = [0u8; 3];
        let mut out = Vec::new();
        loop {
            match cursor.read(&mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(StreamError::EndOfStream) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(out, b"abcdefg");
    }

    #[test]
    fn test_cursors_are_independent() {
        let stream = Stream::new();
        stream.write(b"xyz").unwrap();

        let mut a = stream.cursor();
        let mut b = stream.cursor();
        assert_eq!(read_chunk(&mut a).unwrap(), b"xyz");
        assert_eq!(b.offset(), 0);
        assert_eq!(read_chunk(&mut b).unwrap(), b"xyz");
    }

    #[test]
    fn test_end_of_stream_is_stable() {
        let stream = Stream::new();
        stream.write(b"done").unwrap();
        stream.close().unwrap();

        let mut cursor = stream.cursor();
        assert_eq!(read_chunk(&mut cursor).unwrap(), b"done");
        for _ in 0..3 {
            assert!(matches!(
                read_chunk(&mut cursor),
                Err(StreamError::EndOfStream)
            ));
        }
    }

    #[test]
    fn test_reset_discontinues_with_unread_bytes() {
        let stream = Stream::new();
        stream.write(b"stale").unwrap();
        let mut cursor = stream.cursor();

        stream.reset();
        stream.write(b"fresh").unwrap();

        assert!(cursor.is_stale());
        assert!(matches!(
            read_chunk(&mut cursor),
            Err(StreamError::Discontinued)
        ));
        // Terminal for this cursor.
        assert!(matches!(
            read_chunk(&mut cursor),
            Err(StreamError::Discontinued)
        ));

        let mut fresh = stream.cursor();
        assert!(!fresh.is_stale());
        assert_eq!(read_chunk(&mut fresh).unwrap(), b"fresh");
    }

    #[test]
    fn test_discontinued_takes_precedence_over_end_of_stream() {
        let stream = Stream::new();
        let mut cursor = stream.cursor();
        stream.reset();
        stream.close().unwrap();

        assert!(matches!(
            read_chunk(&mut cursor),
            Err(StreamError::Discontinued)
        ));
    }

    #[test]
    fn test_blocked_read_wakes_on_write() {
        let stream = Stream::new();
        let mut cursor = stream.cursor();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            tx.send(read_chunk(&mut cursor).unwrap()).unwrap();
        });

        thread::sleep(Duration::from_millis(5));
        assert!(rx.try_recv().is_err());

        stream.write(b"go").unwrap();
        assert_eq!(rx.recv().unwrap(), b"go");
        handle.join().unwrap();
    }

    #[test]
    fn test_blocked_read_wakes_on_close_and_reset() {
        let stream = Stream::new();
        let mut closing = stream.cursor();
        let closer = thread::spawn(move || read_chunk(&mut closing));

        thread::sleep(Duration::from_millis(5));
        stream.close().unwrap();
        assert!(matches!(
            closer.join().unwrap(),
            Err(StreamError::EndOfStream)
        ));

        let stream = Stream::new();
        let mut resetting = stream.cursor();
        let resetter = thread::spawn(move || read_chunk(&mut resetting));

        thread::sleep(Duration::from_millis(5));
        stream.reset();
        assert!(matches!(
            resetter.join().unwrap(),
            Err(StreamError::Discontinued)
        ));
    }

    #[test]
    fn test_io_read_maps_outcomes() {
        let stream = Stream::new();
        stream.write(b"abc").unwrap();
        stream.close().unwrap();

        let mut text = String::new();
        stream.cursor().read_to_string(&mut text).unwrap();
        assert_eq!(text, "abc");

        let mut cursor = stream.cursor();
        stream.reset();
        let err = Read::read(&mut cursor, &mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_cursor_outlives_stream_handle() {
        let stream = Stream::new();
        stream.write(b"kept").unwrap();
        stream.close().unwrap();
        let mut cursor = stream.cursor();
        drop(stream);

        assert_eq!(read_chunk(&mut cursor).unwrap(), b"kept");
    }
}
