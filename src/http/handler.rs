use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

/// Responds to a request by filling in the response.
///
/// The body of `request` is not pre-read. Whatever the handler leaves
/// unread is discarded by the connection before the response goes out.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, response: &mut Response, request: &mut Request<'_>);
}

/// Future returned by function handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Adapts a function into a [`Handler`].
///
/// The function gets the same arguments as [`Handler::serve`] and returns a
/// boxed future, so it can await the body:
///
/// ```
/// # use httplet::handler_fn;
/// let echo = handler_fn(|resp, req| {
///     Box::pin(async move {
///         if let Ok(body) = req.body.bytes().await {
///             resp.write(&body);
///         }
///     })
/// });
/// # let _ = echo;
/// ```
pub struct HandlerFn<F>(F);

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a, 'r> Fn(&'a mut Response, &'a mut Request<'r>) -> HandlerFuture<'a> + Send + Sync,
{
    HandlerFn(f)
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a, 'r> Fn(&'a mut Response, &'a mut Request<'r>) -> HandlerFuture<'a> + Send + Sync,
{
    async fn serve(&self, response: &mut Response, request: &mut Request<'_>) {
        (self.0)(response, request).await
    }
}

/// Fallback for paths no route matches: 404 with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn serve(&self, response: &mut Response, _request: &mut Request<'_>) {
        response.write(&[]);
        response.set_status(StatusCode::NOT_FOUND);
    }
}
