//! httplet - a small keep-alive HTTP/1.1 server
//!
//! Core library: request decoding, routing, response encoding, and the
//! per-connection serve loop.

pub mod config;
pub mod http;
pub mod server;

pub use http::handler::{handler_fn, Handler, HandlerFuture, NotFound};
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode};
pub use http::router::{RouteError, Router};
pub use server::{Server, ServerError};
