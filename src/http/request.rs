use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, ReadBuf, Take};

/// The single protocol version the server speaks.
pub const HTTP_VERSION: &str = "HTTP/1.1";

pub const CONTENT_LENGTH: &str = "Content-Length";

/// HTTP request methods understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Submit data; always carries a Content-Length
    POST,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use httplet::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }

    /// Whether a request with this method must declare its body length.
    pub fn requires_body(&self) -> bool {
        matches!(self, Method::POST)
    }
}

/// Request body, limited to the declared Content-Length.
///
/// Reads come straight from the connection's buffered reader, so the bytes
/// after the body stay buffered for the next request on the connection.
pub struct Body<'a> {
    inner: Take<&'a mut (dyn AsyncBufRead + Send + Unpin)>,
}

impl<'a> Body<'a> {
    pub fn new(source: &'a mut (dyn AsyncBufRead + Send + Unpin), length: u64) -> Self {
        Self {
            inner: AsyncReadExt::take(source, length),
        }
    }

    /// Bytes of the body not yet read.
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }

    /// Reads the rest of the body into memory.
    pub async fn bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.remaining().min(64 * 1024) as usize);
        self.inner.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Discards whatever the handler left unread. Returns the number of
    /// bytes skipped.
    pub async fn drain(&mut self) -> io::Result<u64> {
        tokio::io::copy(&mut self.inner, &mut tokio::io::sink()).await
    }
}

impl AsyncRead for Body<'_> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl std::fmt::Debug for Body<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// A decoded request.
///
/// Handlers may read the body; everything else should be treated as
/// read-only.
#[derive(Debug)]
pub struct Request<'a> {
    /// The HTTP method (GET or POST)
    pub method: Method,
    /// The request target exactly as sent, e.g. "/search?q=rust"
    pub target: String,
    /// Percent-decoded path used for routing, e.g. "/search"
    pub path: String,
    /// Query string without the leading '?'
    pub query: Option<String>,
    /// Protocol version, always [`HTTP_VERSION`]
    pub version: String,
    /// Request headers; one value per name, Content-Length under its
    /// canonical spelling
    pub headers: HashMap<String, String>,
    /// Declared body length
    pub content_length: u64,
    pub body: Body<'a>,
}

impl Request<'_> {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }
}
