use std::collections::HashMap;

use bytes::BytesMut;

use crate::http::request::HTTP_VERSION;

/// Numeric HTTP status code.
///
/// Handlers may use any code; the associated constants cover the ones the
/// server itself produces plus the common application ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 201 Created
    pub const CREATED: StatusCode = StatusCode(201);
    /// 204 No Content
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 404 Not Found
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    /// 405 Method Not Allowed
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use httplet::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the standard reason phrase, or an empty string for codes
    /// without one.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            413 => "Payload Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            _ => "",
        }
    }
}

/// An HTTP response under construction.
///
/// The session hands every handler a fresh `Response::new()`; the handler
/// fills it in and the writer serializes it once.
#[derive(Debug)]
pub struct Response {
    /// Protocol version for the status line
    pub version: String,
    /// The HTTP status code
    pub status: StatusCode,
    /// Status text following the code
    pub reason: String,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    body: BytesMut,
}

impl Response {
    /// An empty `HTTP/1.1 200 OK` response with no headers.
    pub fn new() -> Self {
        Self {
            version: HTTP_VERSION.to_string(),
            status: StatusCode::OK,
            reason: StatusCode::OK.reason_phrase().to_string(),
            headers: HashMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Appends bytes to the body and returns how many were written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Sets the status code together with its standard reason phrase.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.reason = status.reason_phrase().to_string();
    }

    /// Adds or replaces a header.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Length of the body written so far.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// A bodiless response carrying only a status.
    pub fn with_status(status: StatusCode) -> Self {
        let mut response = Self::new();
        response.set_status(status);
        response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
