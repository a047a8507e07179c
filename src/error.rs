//! Error types returned by [`Stream`](crate::Stream) and [`Cursor`](crate::Cursor).

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    /// Producer wrote after `close`.
    #[error("write on closed stream")]
    Closed,
    /// Cursor drained every byte of a closed stream.
    #[error("end of stream")]
    EndOfStream,
    /// Stream was reset after the cursor was created.
    #[error("stream discontinued")]
    Discontinued,
    #[error("stream contents are not valid UTF-8: {0}")]
    InvalidText(#[from] FromUtf8Error),
}

impl StreamError {
    /// True for the normal completion signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match err {
            StreamError::Closed => io::ErrorKind::BrokenPipe,
            StreamError::EndOfStream | StreamError::Discontinued => io::ErrorKind::UnexpectedEof,
            StreamError::InvalidText(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
