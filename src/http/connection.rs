use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, warn};

use crate::config::SessionSettings;
use crate::http::parser::{DecodeError, RequestDecoder};
use crate::http::response::{Response, StatusCode};
use crate::http::router::SharedRoutes;
use crate::http::writer::ResponseWriter;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("write failed: {0}")]
    TransportWrite(#[source] std::io::Error),
}

/// One accepted connection, served until the peer leaves or something
/// fails.
///
/// Requests are handled strictly one after another: the next request is not
/// decoded before the previous response has been written. Every connection
/// is kept alive regardless of any `Connection` header.
pub struct Connection<S> {
    stream: S,
    routes: SharedRoutes,
    settings: SessionSettings,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// A zero `request_buffer_size` is raised to 1; an empty read buffer
    /// would look like end of stream.
    pub fn new(stream: S, routes: SharedRoutes, mut settings: SessionSettings) -> Self {
        settings.request_buffer_size = settings.request_buffer_size.max(1);
        Self {
            stream,
            routes,
            settings,
        }
    }

    /// Runs the decode → route → handle → drain → write loop.
    ///
    /// Returns `Ok` when the peer closes between requests. Any decode or
    /// write failure ends the connection; malformed requests get a
    /// `400 Bad Request` first.
    pub async fn run(self) -> Result<(), SessionError> {
        let Connection {
            stream,
            routes,
            settings,
        } = self;
        let mut served: u64 = 0;

        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::with_capacity(settings.request_buffer_size, read_half);

        loop {
            let decoded = RequestDecoder::new(settings.max_line_length)
                .decode(&mut reader)
                .await;

            let mut request = match decoded {
                Ok(request) => request,
                Err(DecodeError::CleanClose) => {
                    debug!(served, "peer closed connection");
                    return Ok(());
                }
                Err(e) if e.is_malformed() => {
                    warn!(error = %e, "rejecting malformed request");
                    let mut response = Response::with_status(StatusCode::BAD_REQUEST);
                    // The connection is closed either way.
                    if let Err(write_err) =
                        ResponseWriter::new(&mut response, settings.response_buffer_size)
                            .write_to_stream(&mut write_half)
                            .await
                    {
                        debug!(error = %write_err, "could not send 400 response");
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };

            let table = routes.load_full();
            let handler = table.lookup(&request.path);

            debug!(
                method = request.method.as_str(),
                path = %request.path,
                content_length = request.content_length,
                "dispatching request"
            );

            let mut response = Response::new();
            handler.serve(&mut response, &mut request).await;

            // Keep the stream aligned on the next request.
            let skipped = request.body.drain().await.map_err(DecodeError::TransportRead)?;
            if skipped > 0 {
                debug!(skipped, "discarded unread request body");
            }
            drop(request);

            ResponseWriter::new(&mut response, settings.response_buffer_size)
                .write_to_stream(&mut write_half)
                .await
                .map_err(SessionError::TransportWrite)?;

            served += 1;
        }
    }
}
