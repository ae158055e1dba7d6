//! Line assembly over a buffered byte stream.
//!
//! A buffered reader hands out whatever it currently holds, so one logical
//! line can arrive as several fragments. Each fragment carries a `more` flag
//! saying whether the line continues in the next one; [`LineAssembler`]
//! concatenates fragments until a fragment ends the line.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::http::parser::DecodeError;

/// Accumulates line fragments into complete lines.
#[derive(Debug)]
pub struct LineAssembler {
    buf: BytesMut,
    pending: bool,
    limit: usize,
}

impl LineAssembler {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            pending: false,
            limit,
        }
    }

    /// Adds one fragment. Returns the complete line, without its terminator,
    /// once a fragment with `more == false` arrives.
    pub fn push(&mut self, fragment: &[u8], more: bool) -> Result<Option<Bytes>, DecodeError> {
        if self.buf.len() + fragment.len() > self.limit {
            return Err(DecodeError::LineTooLong(self.limit));
        }
        self.buf.extend_from_slice(fragment);

        if more {
            self.pending = true;
            return Ok(None);
        }

        self.pending = false;
        if self.buf.last() == Some(&b'\r') {
            self.buf.truncate(self.buf.len() - 1);
        }
        Ok(Some(self.buf.split().freeze()))
    }

    /// True while part of a line has been seen but not its end.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Reads the next complete line from `reader`.
///
/// Returns `Ok(None)` when the stream ends between lines. Ending in the
/// middle of a line is a read error.
pub async fn next_line<R>(
    reader: &mut R,
    lines: &mut LineAssembler,
) -> Result<Option<Bytes>, DecodeError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    loop {
        let (consumed, line) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                if lines.is_pending() {
                    return Err(DecodeError::TransportRead(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed mid-line",
                    )));
                }
                return Ok(None);
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(end) => (end + 1, lines.push(&available[..end], false)?),
                None => (available.len(), lines.push(available, true)?),
            }
        };
        reader.consume(consumed);

        if line.is_some() {
            return Ok(line);
        }
    }
}
