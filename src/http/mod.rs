//! HTTP protocol implementation.
//!
//! A restricted HTTP/1.1 dialect: absolute-path targets, GET and POST,
//! single-valued headers, bodies framed only by `Content-Length`, and every
//! connection kept alive.
//!
//! # Architecture
//!
//! - **`line`**: assembles complete lines from fragmented buffered reads
//! - **`parser`**: the request decoding state machine
//! - **`request`**: decoded request and its length-limited body
//! - **`response`**: response under construction and status codes
//! - **`writer`**: serializes and writes a response in one flush
//! - **`router`**: longest-match route table
//! - **`handler`**: the handler trait, function adapter and not-found fallback
//! - **`connection`**: the per-connection serve loop
//!
//! # Connection Loop
//!
//! ```text
//!        ┌─────────────┐
//!        │   Decode    │ ← request line, headers; body left on the stream
//!        └──────┬──────┘
//!               │ Request decoded
//!               ▼
//!        ┌──────────────────┐
//!        │   Route + Handle │ ← longest matching pattern, or 404
//!        └──────┬───────────┘
//!               │ Handler returned
//!               ▼
//!        ┌──────────────────┐
//!        │  Drain + Write   │ ← skip unread body, send response
//!        └──────┬───────────┘
//!               │
//!               ├─ Written → Decode (same connection)
//!               └─ Peer closed / error → Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use httplet::{Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut router = Router::new();
//!     router.route_fn("/hello", |resp, _req| {
//!         Box::pin(async move {
//!             resp.set_status(StatusCode::OK);
//!             resp.write(b"hello\n");
//!         })
//!     })?;
//!
//!     let server = Server::new("127.0.0.1:8080", router)?;
//!     let _ = server.listen_and_serve().await;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod handler;
pub mod line;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;
