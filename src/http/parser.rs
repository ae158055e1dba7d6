//! Request decoding.
//!
//! The decoder is a small state machine fed one complete line at a time:
//!
//! ```text
//! RequestLine --(valid request line)--> Headers --(empty line)--> BodyReady
//! ```
//!
//! Reaching `BodyReady` ends decoding. The body is not read here; the
//! request gets a [`Body`] that yields at most `Content-Length` bytes from
//! the same reader.

use std::collections::HashMap;

use thiserror::Error;
use tokio::io::AsyncBufRead;
use url::Url;

use crate::http::line::{next_line, LineAssembler};
use crate::http::request::{Body, Method, Request, CONTENT_LENGTH, HTTP_VERSION};

/// Default upper bound on a single request or header line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("POST request without Content-Length")]
    MissingContentLength,

    #[error("Content-Length must be a non-negative integer, got {0:?}")]
    InvalidContentLength(String),

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("connection closed by peer")]
    CleanClose,

    #[error("read failed: {0}")]
    TransportRead(#[from] std::io::Error),
}

impl DecodeError {
    /// True for errors caused by what the client sent, as opposed to the
    /// transport going away.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, DecodeError::CleanClose | DecodeError::TransportRead(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    RequestLine,
    Headers,
    BodyReady,
}

/// Parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub path: String,
    pub query: Option<String>,
    pub version: String,
}

/// Builds one request from the lines of a connection.
#[derive(Debug)]
pub struct RequestDecoder {
    state: DecodeState,
    lines: LineAssembler,
    request_line: Option<RequestLine>,
    headers: HashMap<String, String>,
}

impl RequestDecoder {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            state: DecodeState::RequestLine,
            lines: LineAssembler::new(max_line_length),
            request_line: None,
            headers: HashMap::new(),
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Processes one complete line and advances the state machine.
    pub fn step(&mut self, line: &[u8]) -> Result<DecodeState, DecodeError> {
        match self.state {
            DecodeState::RequestLine => {
                let text = std::str::from_utf8(line).map_err(|_| {
                    DecodeError::MalformedRequestLine(String::from_utf8_lossy(line).into_owned())
                })?;
                self.request_line = Some(parse_request_line(text)?);
                self.state = DecodeState::Headers;
            }

            DecodeState::Headers => {
                if line.is_empty() {
                    self.state = DecodeState::BodyReady;
                } else {
                    let text = std::str::from_utf8(line).map_err(|_| {
                        DecodeError::MalformedHeader(String::from_utf8_lossy(line).into_owned())
                    })?;
                    let (name, value) = parse_header(text)?;
                    if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                        self.insert_content_length(value)?;
                    } else {
                        self.headers.insert(name.to_string(), value.to_string());
                    }
                }
            }

            DecodeState::BodyReady => {
                let text = String::from_utf8_lossy(line).into_owned();
                return Err(DecodeError::MalformedHeader(text));
            }
        }

        Ok(self.state)
    }

    /// Content-Length is stored under its canonical name whatever case it
    /// arrived in. Repeats must agree.
    fn insert_content_length(&mut self, value: &str) -> Result<(), DecodeError> {
        match self.headers.get(CONTENT_LENGTH) {
            Some(prev) if prev != value => Err(DecodeError::InvalidContentLength(format!(
                "{prev}, {value}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.headers.insert(CONTENT_LENGTH.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    /// Reads lines from `reader` until the header block ends, then returns
    /// the request with its body bound to the same reader.
    ///
    /// A stream that ends before the first byte of a request yields
    /// [`DecodeError::CleanClose`].
    pub async fn decode<'a, R>(mut self, reader: &'a mut R) -> Result<Request<'a>, DecodeError>
    where
        R: AsyncBufRead + Send + Unpin,
    {
        while self.state != DecodeState::BodyReady {
            match next_line(reader, &mut self.lines).await? {
                Some(line) => {
                    self.step(&line)?;
                }
                None if self.state == DecodeState::RequestLine => {
                    return Err(DecodeError::CleanClose);
                }
                None => {
                    return Err(DecodeError::TransportRead(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed inside the header block",
                    )));
                }
            }
        }

        self.finish(reader)
    }

    /// The `BodyReady` transition: settle the body length and attach the
    /// body stream.
    fn finish<'a>(
        mut self,
        reader: &'a mut (dyn AsyncBufRead + Send + Unpin),
    ) -> Result<Request<'a>, DecodeError> {
        let RequestLine { method, target, path, query, version } = self
            .request_line
            .take()
            .ok_or_else(|| DecodeError::MalformedRequestLine(String::new()))?;

        let content_length = match self.headers.get(CONTENT_LENGTH) {
            Some(raw) => parse_content_length(raw)?,
            None if method.requires_body() => return Err(DecodeError::MissingContentLength),
            None => {
                self.headers.insert(CONTENT_LENGTH.to_string(), "0".to_string());
                0
            }
        };

        Ok(Request {
            method,
            target,
            path,
            query,
            version,
            headers: self.headers,
            content_length,
            body: Body::new(reader, content_length),
        })
    }
}

/// Splits `<METHOD> <target> <VERSION>` and validates each part.
pub fn parse_request_line(line: &str) -> Result<RequestLine, DecodeError> {
    let malformed = || DecodeError::MalformedRequestLine(line.to_string());

    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(malformed());
    };

    let method = Method::from_str(method).ok_or_else(malformed)?;
    if version != HTTP_VERSION {
        return Err(malformed());
    }

    let (path, query) = parse_target(target)?;

    Ok(RequestLine {
        method,
        target: target.to_string(),
        path,
        query,
        version: version.to_string(),
    })
}

/// Accepts only absolute paths ("/a/b?x=1"); anything with a scheme or
/// authority is rejected.
///
/// The routing path is the part before '?', percent-decoded, with dot
/// segments kept as sent.
pub fn parse_target(target: &str) -> Result<(String, Option<String>), DecodeError> {
    let invalid = || DecodeError::InvalidTarget(target.to_string());

    if !target.starts_with('/') || target.starts_with("//") {
        return Err(invalid());
    }

    // A leading "/\" would resolve to another host.
    let base = Url::parse("http://localhost").map_err(|_| invalid())?;
    let url = base.join(target).map_err(|_| invalid())?;
    if url.host_str() != Some("localhost") {
        return Err(invalid());
    }

    let (raw_path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };

    if !valid_escapes(raw_path) {
        return Err(invalid());
    }
    let path = urlencoding::decode(raw_path).map_err(|_| invalid())?;

    Ok((path.into_owned(), query))
}

/// Every '%' must start a two-digit hex escape.
fn valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}

/// Splits a header line on the first ": ".
pub fn parse_header(line: &str) -> Result<(&str, &str), DecodeError> {
    line.split_once(": ")
        .ok_or_else(|| DecodeError::MalformedHeader(line.to_string()))
}

fn parse_content_length(raw: &str) -> Result<u64, DecodeError> {
    raw.parse::<u64>()
        .map_err(|_| DecodeError::InvalidContentLength(raw.to_string()))
}
