use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::CONTENT_LENGTH;
use crate::http::response::Response;

const LINE_END: &[u8] = b"\n";

/// Serializes a response, first replacing any caller-set Content-Length with
/// the real body length.
pub fn encode_response(resp: &mut Response, capacity: usize) -> BytesMut {
    resp.headers
        .retain(|k, _| !k.eq_ignore_ascii_case(CONTENT_LENGTH));
    resp.headers
        .insert(CONTENT_LENGTH.to_string(), resp.content_length().to_string());

    let mut buf = BytesMut::with_capacity(capacity.max(resp.content_length() + 128));

    // Status line
    buf.put_slice(resp.version.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(resp.status.as_u16().to_string().as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(resp.reason.as_bytes());
    buf.put_slice(LINE_END);

    // Headers
    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(LINE_END);
    }

    // Header/body separator
    buf.put_slice(LINE_END);

    // Body
    buf.put_slice(resp.body());

    buf
}

/// Holds one fully encoded response until it has been written out.
pub struct ResponseWriter {
    buffer: BytesMut,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &mut Response, capacity: usize) -> Self {
        Self {
            buffer: encode_response(response, capacity),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes the whole buffer, then flushes once.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            self.written += n;
        }

        stream.flush().await
    }
}
