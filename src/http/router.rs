//! Path routing.
//!
//! # Matching rules
//! - A pattern without a trailing `/` matches only the identical path
//! - A pattern ending in `/` matches every path it prefixes
//! - The longest matching pattern wins
//! - No match falls through to the fallback handler ([`NotFound`] unless
//!   replaced)
//!
//! Routes are registered on a [`Router`] and frozen into an immutable
//! [`RouteTable`] before serving. Connections only ever read a table; a
//! running server can swap in a new one as a whole.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::http::handler::{handler_fn, Handler, HandlerFuture, NotFound};
use crate::http::request::Request;
use crate::http::response::Response;

/// Route table shared between the acceptor and every connection.
pub type SharedRoutes = Arc<ArcSwap<RouteTable>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route pattern must not be empty")]
    EmptyPattern,
}

/// Does `path` match `pattern`?
///
/// `"/"` matches every path, `"/cart/"` matches `"/cart/*"`, `"/login"`
/// matches only `"/login"`.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if pattern.ends_with('/') {
        path.starts_with(pattern)
    } else {
        pattern == path
    }
}

/// Collects routes before the server starts.
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: Arc::new(NotFound),
        }
    }

    /// Registers `handler` for `pattern`. Registering the same pattern twice
    /// keeps the later handler.
    pub fn route<H>(&mut self, pattern: impl Into<String>, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler + 'static,
    {
        self.route_arc(pattern, Arc::new(handler))
    }

    pub fn route_arc(
        &mut self,
        pattern: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Self, RouteError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(RouteError::EmptyPattern);
        }
        self.routes.insert(pattern, handler);
        Ok(self)
    }

    /// Registers a function returning a boxed future; see [`handler_fn`].
    pub fn route_fn<F>(&mut self, pattern: impl Into<String>, f: F) -> Result<&mut Self, RouteError>
    where
        F: for<'a, 'r> Fn(&'a mut Response, &'a mut Request<'r>) -> HandlerFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, handler_fn(f))
    }

    /// Replaces the handler used when nothing matches.
    pub fn fallback<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.fallback = Arc::new(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freezes the registered routes into a lookup table.
    pub fn build(self) -> RouteTable {
        let mut routes: Vec<(String, Arc<dyn Handler>)> = self.routes.into_iter().collect();
        // Longest first, so the first match is the most specific one.
        routes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        RouteTable {
            routes,
            fallback: self.fallback,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of the routes, ordered longest pattern first.
pub struct RouteTable {
    routes: Vec<(String, Arc<dyn Handler>)>,
    fallback: Arc<dyn Handler>,
}

impl RouteTable {
    /// Handler for `path`, or the fallback.
    pub fn lookup(&self, path: &str) -> &Arc<dyn Handler> {
        self.routes
            .iter()
            .find(|(pattern, _)| path_matches(pattern, path))
            .map(|(_, handler)| handler)
            .unwrap_or(&self.fallback)
    }

    /// The pattern that would serve `path`, if any.
    pub fn matched_pattern(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(pattern, _)| path_matches(pattern, path))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(pattern, _)| pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_shared(self) -> SharedRoutes {
        Arc::new(ArcSwap::from_pointee(self))
    }
}

impl From<Router> for RouteTable {
    fn from(router: Router) -> Self {
        router.build()
    }
}
