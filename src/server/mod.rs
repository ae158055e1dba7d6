//! TCP acceptor and lifecycle.

pub mod listener;

pub use listener::{Server, ServerError, ShutdownHandle};
